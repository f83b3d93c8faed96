//! CLI helper functions

use crate::{
    reader::{ReaderSettings, SourceReader},
    source::SourceDescriptor,
    storage::NdjsonWriter,
};
use eyre::{Context, Result};
use std::path::Path;

pub const BATCH_SIZE_VAR: &str = "EXTRACT_BATCH_SIZE";
pub const CHANNEL_CAPACITY_VAR: &str = "EXTRACT_CHANNEL_CAPACITY";
pub const MONGODB_URI_VAR: &str = "MONGODB_URI";

/// Load reader settings from environment variables
///
/// Expected environment variables:
/// - EXTRACT_BATCH_SIZE: documents per MongoDB round-trip (optional, default 10000)
/// - EXTRACT_CHANNEL_CAPACITY: records buffered ahead of the consumer (optional, default 64)
pub fn load_reader_settings() -> Result<ReaderSettings> {
    let defaults = ReaderSettings::default();

    let batch_size = match std::env::var(BATCH_SIZE_VAR) {
        Ok(value) => parse_positive(BATCH_SIZE_VAR, &value)?,
        Err(_) => defaults.batch_size,
    };
    let channel_capacity = match std::env::var(CHANNEL_CAPACITY_VAR) {
        Ok(value) => parse_positive(CHANNEL_CAPACITY_VAR, &value)?,
        Err(_) => defaults.channel_capacity,
    };

    Ok(ReaderSettings {
        batch_size,
        channel_capacity,
    })
}

fn parse_positive<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let parsed: T = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: {}", name, value))?;
    if parsed <= T::default() {
        eyre::bail!("Invalid {}: {} (must be greater than zero)", name, value);
    }
    Ok(parsed)
}

/// Resolve the MongoDB connection string
///
/// An explicit `--uri` wins over the MONGODB_URI environment variable.
pub fn load_connection_uri(explicit: Option<String>) -> Result<String> {
    match explicit {
        Some(uri) => Ok(uri),
        None => std::env::var(MONGODB_URI_VAR).with_context(|| {
            format!(
                "No connection string given: pass --uri or set {}",
                MONGODB_URI_VAR
            )
        }),
    }
}

/// Extract one source and write its records as NDJSON
///
/// Writes to `output` when given, stdout otherwise. Returns the number of
/// records written.
pub async fn extract_to_ndjson(
    reader: &SourceReader,
    descriptor: SourceDescriptor,
    output: Option<&Path>,
) -> Result<u64> {
    let name = descriptor.resource_name();
    let mut stream = reader
        .produce(descriptor)
        .with_context(|| format!("Cannot extract from {}", name))?;

    let count = match output {
        Some(path) => {
            let mut writer = NdjsonWriter::create(path)?;
            let count = writer.write_stream(&mut stream).await?;
            writer.finish()?;
            count
        }
        None => {
            let mut writer = NdjsonWriter::stdout();
            let count = writer.write_stream(&mut stream).await?;
            writer.finish()?;
            count
        }
    };

    Ok(count)
}
