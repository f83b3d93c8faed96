//! File system output for extracted records

mod ndjson;

pub use ndjson::NdjsonWriter;
