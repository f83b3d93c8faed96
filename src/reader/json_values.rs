//! JSON decoding: one record per array element or top-level value

use crate::error::ExtractError;
use crate::session::{Emitter, Outcome};
use crate::source::Record;
use serde::de::{self, DeserializeSeed, Deserializer, SeqAccess, Visitor};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Stream the records of a JSON file through `emitter`
///
/// A file whose first value is an array yields its elements one at a time
/// without loading the whole array. Any other file is read as a sequence of
/// whitespace-separated values (NDJSON, or a single document). An empty
/// file yields nothing. Runs on a blocking thread.
///
/// The first significant byte fixes the mode for the whole file. Once it is
/// `[`, only that one array is read: anything after its closing bracket
/// other than whitespace, such as a second array in `[1,2]\n[3,4]`, ends
/// the stream with a `ResourceRead` error after the first array's elements.
pub(crate) fn read_values(path: &Path, emitter: &mut Emitter) -> Outcome {
    if emitter.is_cancelled() {
        return Outcome::Cancelled;
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => return Outcome::Failed(ExtractError::open(emitter.source(), err)),
    };
    emitter.streaming();

    let mut reader = BufReader::new(file);
    let first = match skip_bom(&mut reader).and_then(|()| first_significant_byte(&mut reader)) {
        Ok(first) => first,
        Err(err) => return Outcome::Failed(ExtractError::read(emitter.source(), err)),
    };

    match first {
        None => end_of_input(emitter),
        Some(b'[') => read_array(reader, emitter),
        Some(_) => read_sequence(reader, emitter),
    }
}

fn read_array(reader: BufReader<File>, emitter: &mut Emitter) -> Outcome {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let result = ArrayElements { emitter: &mut *emitter }
        .deserialize(&mut de)
        .and_then(|()| de.end());

    match result {
        Ok(()) => end_of_input(emitter),
        Err(_) if emitter.is_cancelled() => Outcome::Cancelled,
        Err(err) => Outcome::Failed(ExtractError::read(emitter.source(), err)),
    }
}

fn read_sequence(reader: BufReader<File>, emitter: &mut Emitter) -> Outcome {
    let values = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();

    for value in values {
        let value = match value {
            Ok(value) => value,
            Err(err) => return Outcome::Failed(ExtractError::read(emitter.source(), err)),
        };
        if emitter.blocking_next(Record::Fields(value)).is_err() {
            return Outcome::Cancelled;
        }
    }

    end_of_input(emitter)
}

/// A cancel that lands after the last record still wins over completion
fn end_of_input(emitter: &Emitter) -> Outcome {
    if emitter.is_cancelled() {
        Outcome::Cancelled
    } else {
        Outcome::Completed
    }
}

/// Forwards each element of a JSON array as it is decoded
struct ArrayElements<'a> {
    emitter: &'a mut Emitter,
}

impl<'de> DeserializeSeed<'de> for ArrayElements<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ArrayElements<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("an array of records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(value) = seq.next_element::<Value>()? {
            if self.emitter.blocking_next(Record::Fields(value)).is_err() {
                return Err(de::Error::custom("extraction cancelled"));
            }
        }
        Ok(())
    }
}

fn skip_bom(reader: &mut impl BufRead) -> io::Result<()> {
    if reader.fill_buf()?.starts_with(UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Peek at the first non-whitespace byte, consuming the whitespace before it
fn first_significant_byte(reader: &mut impl BufRead) -> io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }

        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let byte = buf[pos];
                reader.consume(pos);
                return Ok(Some(byte));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}
