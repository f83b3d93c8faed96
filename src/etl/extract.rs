//! Extractor trait for collecting a whole source at once

use crate::reader::SourceReader;
use crate::source::{Record, SourceDescriptor};

use eyre::{Context, Result};
use futures::TryStreamExt;

/// Extractor trait for extracting data from a source
///
/// Implementors gather every item from a source into memory. Use a
/// [`RecordStream`](crate::RecordStream) directly when records should be
/// handled as they arrive.
///
/// # Example
/// ```no_run
/// use lazy_extract::etl::Extractor;
/// use eyre::Result;
/// use std::path::PathBuf;
///
/// struct LineExtractor {
///     path: PathBuf,
/// }
///
/// impl Extractor for LineExtractor {
///     type Item = String;
///
///     async fn extract(&self) -> Result<Vec<Self::Item>> {
///         let content = std::fs::read_to_string(&self.path)?;
///         Ok(content.lines().map(str::to_string).collect())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of items extracted
    type Item: Send;

    /// Extract items from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, I/O, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send;
}

/// Collects every record of one source through a [`SourceReader`]
///
/// Each call to `extract` starts a fresh session, so the source is read
/// again from the beginning.
pub struct SourceExtractor {
    reader: SourceReader,
    descriptor: SourceDescriptor,
}

impl SourceExtractor {
    pub fn new(reader: SourceReader, descriptor: SourceDescriptor) -> Self {
        Self { reader, descriptor }
    }
}

impl Extractor for SourceExtractor {
    type Item = Record;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let name = self.descriptor.resource_name();
        let stream = self
            .reader
            .produce(self.descriptor.clone())
            .with_context(|| format!("Failed to start extraction from {}", name))?;

        let records: Vec<Record> = stream
            .try_collect()
            .await
            .with_context(|| format!("Failed to extract records from {}", name))?;

        log::debug!("Collected {} record(s) from {}", records.len(), name);
        Ok(records)
    }
}
