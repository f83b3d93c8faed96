//! Decoded records as handed to subscribers

use mongodb::bson::{Bson, Document};
use serde_json::Value;

/// One decoded unit from a source
///
/// The reader never looks inside a record; it only forwards it.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A CSV row (object of header -> string) or a JSON element
    Fields(Value),
    /// A document from a document store
    Document(Document),
}

impl Record {
    /// Borrow the JSON value of a file record
    pub fn as_fields(&self) -> Option<&Value> {
        match self {
            Self::Fields(value) => Some(value),
            Self::Document(_) => None,
        }
    }

    /// Borrow the BSON document of a document-store record
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Fields(_) => None,
            Self::Document(doc) => Some(doc),
        }
    }

    /// Render the record as JSON
    ///
    /// Documents are converted to relaxed extended JSON, so ObjectIds and
    /// dates come out as `{"$oid": ...}` / `{"$date": ...}` objects.
    pub fn into_json(self) -> Value {
        match self {
            Self::Fields(value) => value,
            Self::Document(doc) => Bson::Document(doc).into_relaxed_extjson(),
        }
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self::Fields(value)
    }
}

impl From<Document> for Record {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    #[test]
    fn test_document_into_json() {
        let record = Record::from(doc! { "name": "widget", "qty": 3 });
        assert!(record.as_fields().is_none());
        assert_eq!(record.into_json(), json!({"name": "widget", "qty": 3}));
    }

    #[test]
    fn test_fields_pass_through() {
        let record = Record::from(json!({"a": "1"}));
        assert_eq!(record.as_fields(), Some(&json!({"a": "1"})));
        assert_eq!(record.into_json(), json!({"a": "1"}));
    }
}
