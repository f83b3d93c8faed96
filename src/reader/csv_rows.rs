//! CSV decoding: one record per data row

use crate::error::ExtractError;
use crate::session::{Emitter, Outcome};
use crate::source::Record;
use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Stream every data row of a CSV file through `emitter`
///
/// The first row is the header. Rows may be shorter or longer than the
/// header: missing trailing fields are left out, extra fields are keyed by
/// their position as `_<index>`. Runs on a blocking thread.
pub(crate) fn read_rows(path: &Path, emitter: &mut Emitter) -> Outcome {
    if emitter.is_cancelled() {
        return Outcome::Cancelled;
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => return Outcome::Failed(ExtractError::open(emitter.source(), err)),
    };
    emitter.streaming();

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(err) => return Outcome::Failed(ExtractError::read(emitter.source(), err)),
    };
    log::trace!("CSV headers for {}: {:?}", emitter.source(), headers);

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) => return Outcome::Failed(ExtractError::read(emitter.source(), err)),
        };

        if emitter
            .blocking_next(Record::Fields(row_to_fields(&headers, &row)))
            .is_err()
        {
            return Outcome::Cancelled;
        }
    }

    if emitter.is_cancelled() {
        return Outcome::Cancelled;
    }
    Outcome::Completed
}

fn row_to_fields(headers: &StringRecord, row: &StringRecord) -> Value {
    let mut fields = Map::with_capacity(row.len());
    for (index, field) in row.iter().enumerate() {
        let key = match headers.get(index) {
            Some(header) => header.to_string(),
            None => format!("_{}", index),
        };
        fields.insert(key, Value::String(field.to_string()));
    }
    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_to_fields_keeps_header_order() {
        let headers = StringRecord::from(vec!["b", "a"]);
        let row = StringRecord::from(vec!["2", "1"]);
        let fields = row_to_fields(&headers, &row);

        assert_eq!(fields, json!({"b": "2", "a": "1"}));
        let keys: Vec<_> = fields.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_row_to_fields_uneven_rows() {
        let headers = StringRecord::from(vec!["a", "b"]);

        let short = StringRecord::from(vec!["1"]);
        assert_eq!(row_to_fields(&headers, &short), json!({"a": "1"}));

        let long = StringRecord::from(vec!["1", "2", "3"]);
        assert_eq!(
            row_to_fields(&headers, &long),
            json!({"a": "1", "b": "2", "_2": "3"})
        );
    }
}
