//! Source descriptors and the records they produce

mod descriptor;
mod record;

pub use descriptor::{
    DOCUMENT_STORE_SCHEME, DocumentStoreSource, FileFormat, FileSource, RelationalSource,
    SourceDescriptor,
};
pub use record::Record;
