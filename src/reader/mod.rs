//! Source readers
//!
//! [`SourceReader`] validates a [`SourceDescriptor`] up front and then
//! hands back a [`RecordStream`] fed by a producer task that owns the
//! underlying file or document-store cursor.

mod csv_rows;
mod document_store;
mod json_values;
mod mongo;

pub use document_store::{DEFAULT_BATCH_SIZE, DocumentCursor, DocumentStore};
pub use mongo::{DEFAULT_DATABASE, MongoStore};

use crate::diagnostics::{DiagnosticsSink, LogSink};
use crate::error::ExtractError;
use crate::session::{Emitter, Outcome, RecordStream, spawn_session};
use crate::source::{DocumentStoreSource, FileFormat, FileSource, SourceDescriptor};
use std::path::Path;
use std::sync::Arc;

/// Records buffered between a producer and its subscriber by default
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Tuning knobs shared by every session a reader starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Documents fetched per document-store round-trip
    pub batch_size: u32,
    /// Records buffered before the producer waits for the subscriber
    pub channel_capacity: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

type FileDecoder = fn(&Path, &mut Emitter) -> Outcome;

/// Turns source descriptors into record streams
///
/// # Example
/// ```no_run
/// use futures::TryStreamExt;
/// use lazy_extract::{SourceDescriptor, SourceReader};
///
/// # async fn example() -> eyre::Result<()> {
/// let reader = SourceReader::new();
/// let stream = reader.produce(SourceDescriptor::mongodb(
///     "mongodb://localhost:27017/shop",
///     "orders",
/// ))?;
/// let orders: Vec<_> = stream.try_collect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SourceReader {
    store: Arc<dyn DocumentStore>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    settings: ReaderSettings,
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader {
    /// Reader backed by MongoDB, reporting diagnostics to the `log` facade
    pub fn new() -> Self {
        Self {
            store: Arc::new(MongoStore),
            diagnostics: Arc::new(LogSink),
            settings: ReaderSettings::default(),
        }
    }

    pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_settings(mut self, settings: ReaderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    /// Start an extraction session for `descriptor`
    ///
    /// Validation happens here, before anything is opened. Opening the
    /// resource and every later fault are reported through the returned
    /// stream. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// - `InvalidArgument` for an empty path, connection string or
    ///   collection name, a file extension that does not match the format,
    ///   or a connection string that is not `mongodb://`
    /// - `NotImplemented` for XML files and relational sources
    pub fn produce(&self, descriptor: SourceDescriptor) -> Result<RecordStream, ExtractError> {
        match descriptor {
            SourceDescriptor::File(file) => self.produce_file(file),
            SourceDescriptor::DocumentStore(source) => self.produce_documents(source),
            SourceDescriptor::Relational(source) => {
                if source.connection_uri.trim().is_empty() {
                    return Err(ExtractError::invalid("a connection string must be provided"));
                }
                Err(ExtractError::NotImplemented("Postgres".to_string()))
            }
        }
    }

    pub fn from_csv(&self, path: impl AsRef<Path>) -> Result<RecordStream, ExtractError> {
        self.produce(SourceDescriptor::csv(path))
    }

    pub fn from_json(&self, path: impl AsRef<Path>) -> Result<RecordStream, ExtractError> {
        self.produce(SourceDescriptor::json(path))
    }

    pub fn from_xml(&self, path: impl AsRef<Path>) -> Result<RecordStream, ExtractError> {
        self.produce(SourceDescriptor::xml(path))
    }

    pub fn from_mongodb(
        &self,
        connection_uri: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Result<RecordStream, ExtractError> {
        self.produce(SourceDescriptor::mongodb(connection_uri, collection_name))
    }

    pub fn from_postgres(
        &self,
        connection_uri: impl Into<String>,
    ) -> Result<RecordStream, ExtractError> {
        self.produce(SourceDescriptor::postgres(connection_uri))
    }

    fn produce_file(&self, file: FileSource) -> Result<RecordStream, ExtractError> {
        file.validate()?;

        let decode: FileDecoder = match file.format {
            FileFormat::Csv => csv_rows::read_rows,
            FileFormat::Json => json_values::read_values,
            FileFormat::Xml => return Err(ExtractError::NotImplemented(file.format.to_string())),
        };

        let source = file.path.display().to_string();
        Ok(spawn_session(
            source,
            self.settings.channel_capacity,
            self.diagnostics.clone(),
            move |emitter| stream_file(file, decode, emitter),
        ))
    }

    fn produce_documents(&self, source: DocumentStoreSource) -> Result<RecordStream, ExtractError> {
        source.validate()?;

        let store = self.store.clone();
        let batch_size = self.settings.batch_size.max(1);
        let name = SourceDescriptor::DocumentStore(source.clone()).resource_name();
        Ok(spawn_session(
            name,
            self.settings.channel_capacity,
            self.diagnostics.clone(),
            move |emitter| document_store::stream_documents(store, source, batch_size, emitter),
        ))
    }
}

/// Producer for a file session; the decoder runs on a blocking thread
///
/// The file handle lives inside the decoder, so it is closed by the time
/// the terminal event goes out.
async fn stream_file(file: FileSource, decode: FileDecoder, mut emitter: Emitter) {
    let job = tokio::task::spawn_blocking(move || {
        let outcome = decode(&file.path, &mut emitter);
        (emitter, outcome)
    });

    // a decoder that panics drops its emitter, which reports the failure
    if let Ok((emitter, outcome)) = job.await {
        emitter.finish(outcome).await;
    }
}
