//! Batch extraction on top of record streams
//!
//! This module keeps the `Extractor` abstraction for callers that want all
//! records of a source at once rather than a stream.

mod extract;

pub use extract::{Extractor, SourceExtractor};
