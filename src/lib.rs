//! Lazy Extract
//!
//! Read CSV files, JSON files and MongoDB collections as lazy record streams
//! that share one emission, error and cancellation contract.

pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod etl;
pub mod reader;
pub mod session;
pub mod source;
pub mod storage;

// Re-exports for convenience
pub use diagnostics::{DiagnosticEvent, DiagnosticsSink, LogSink, NullSink};
pub use error::{ErrorKind, ExtractError};
pub use etl::{Extractor, SourceExtractor};
pub use reader::{DocumentCursor, DocumentStore, MongoStore, ReaderSettings, SourceReader};
pub use session::{RecordStream, SessionState};
pub use source::{
    DocumentStoreSource, FileFormat, FileSource, Record, RelationalSource, SourceDescriptor,
};
pub use storage::NdjsonWriter;
