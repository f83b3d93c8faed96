//! NDJSON (Newline Delimited JSON) output for extracted records

use crate::session::RecordStream;
use crate::source::Record;

use eyre::{Context, Result};
use futures::StreamExt;
use std::fs::File;
use std::io::{BufWriter, Stdout, Write};
use std::path::Path;

/// Write records as NDJSON, one line per record
pub struct NdjsonWriter<W: Write> {
    out: BufWriter<W>,
    count: u64,
}

impl NdjsonWriter<File> {
    /// Create (or truncate) an NDJSON file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create NDJSON file: {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl NdjsonWriter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            out: BufWriter::new(inner),
            count: 0,
        }
    }

    /// Number of records written so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Write one record as a single line
    pub fn write(&mut self, record: Record) -> Result<()> {
        serde_json::to_writer(&mut self.out, &record.into_json())
            .context("Failed to serialize record")?;
        self.out.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    /// Drain a stream into the writer, returning how many records it held
    ///
    /// Stops at the stream's error, if any; lines already written stay.
    pub async fn write_stream(&mut self, stream: &mut RecordStream) -> Result<u64> {
        let mut written = 0;
        while let Some(record) = stream.next().await {
            let record = record
                .with_context(|| format!("Extraction from {} failed", stream.source()))?;
            self.write(record)?;
            written += 1;
        }
        Ok(written)
    }

    /// Flush buffered lines and hand back the inner writer
    pub fn finish(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|err| eyre::eyre!("Failed to flush NDJSON output: {}", err.error()))
    }
}
