//! Source descriptors and their synchronous validation

use crate::error::ExtractError;
use mongodb::options::ConnectionString;
use std::path::{Path, PathBuf};

/// Scheme every document-store connection string must use
pub const DOCUMENT_STORE_SCHEME: &str = "mongodb";

/// Textual file formats a [`FileSource`] can be read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Json,
    Xml,
}

impl FileFormat {
    /// Lower-case extension token a file of this format must carry
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::Json => write!(f, "JSON"),
            Self::Xml => write!(f, "XML"),
        }
    }
}

/// A file on the local filesystem read as a given format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub path: PathBuf,
    pub format: FileFormat,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, format: FileFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }

    /// Check the path is present and its extension matches the format
    ///
    /// The extension is lower-cased and compared for equality with the
    /// format token, so `data.CSV` is a CSV file and `data.txt` is not.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty path, a path without an
    /// extension, or an extension naming a different format.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.path.as_os_str().is_empty() {
            return Err(ExtractError::invalid("a file path must be provided"));
        }

        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension {
            Some(ext) if ext == self.format.extension() => Ok(()),
            _ => Err(ExtractError::invalid(format!(
                "file {} does not appear to be {}",
                self.path.display(),
                self.format
            ))),
        }
    }
}

/// A collection in a MongoDB-style document store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStoreSource {
    pub connection_uri: String,
    pub collection_name: String,
}

impl DocumentStoreSource {
    pub fn new(connection_uri: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            connection_uri: connection_uri.into(),
            collection_name: collection_name.into(),
        }
    }

    /// # Errors
    /// Returns `InvalidArgument` when the connection string or collection
    /// name is empty, the connection string does not use the
    /// [`DOCUMENT_STORE_SCHEME`] scheme, or the driver cannot parse it
    /// (bad port, malformed credentials, unknown options).
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.connection_uri.trim().is_empty() {
            return Err(ExtractError::invalid("a connection string must be provided"));
        }

        match connection_scheme(&self.connection_uri) {
            Some(scheme) if scheme == DOCUMENT_STORE_SCHEME => {}
            _ => {
                return Err(ExtractError::invalid(format!(
                    "connection string does not use the {} protocol",
                    DOCUMENT_STORE_SCHEME
                )));
            }
        }

        ConnectionString::parse(&self.connection_uri).map_err(|err| {
            ExtractError::invalid(format!("malformed connection string: {}", err))
        })?;

        if self.collection_name.trim().is_empty() {
            return Err(ExtractError::invalid("a collection name must be provided"));
        }

        Ok(())
    }

    /// Connection string with any credentials masked, for diagnostics
    pub fn redacted_uri(&self) -> String {
        let Some((scheme, rest)) = self.connection_uri.split_once("://") else {
            return self.connection_uri.clone();
        };
        match rest.rsplit_once('@') {
            Some((_, hosts)) => format!("{}://***@{}", scheme, hosts),
            None => self.connection_uri.clone(),
        }
    }
}

/// A relational database source. Declared only; no extractor exists yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalSource {
    pub connection_uri: String,
}

/// Everything a [`SourceReader`](crate::SourceReader) knows how to describe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    File(FileSource),
    DocumentStore(DocumentStoreSource),
    Relational(RelationalSource),
}

impl SourceDescriptor {
    pub fn csv(path: impl AsRef<Path>) -> Self {
        Self::File(FileSource::new(path, FileFormat::Csv))
    }

    pub fn json(path: impl AsRef<Path>) -> Self {
        Self::File(FileSource::new(path, FileFormat::Json))
    }

    pub fn xml(path: impl AsRef<Path>) -> Self {
        Self::File(FileSource::new(path, FileFormat::Xml))
    }

    pub fn mongodb(connection_uri: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self::DocumentStore(DocumentStoreSource::new(connection_uri, collection_name))
    }

    pub fn postgres(connection_uri: impl Into<String>) -> Self {
        Self::Relational(RelationalSource {
            connection_uri: connection_uri.into(),
        })
    }

    /// Human-readable name of the resource, safe to log
    pub fn resource_name(&self) -> String {
        match self {
            Self::File(file) => file.path.display().to_string(),
            Self::DocumentStore(store) => {
                format!("{} ({})", store.collection_name, store.redacted_uri())
            }
            Self::Relational(_) => "relational source".to_string(),
        }
    }
}

/// Scheme of a `scheme://...` connection string
fn connection_scheme(uri: &str) -> Option<&str> {
    let (scheme, rest) = uri.trim().split_once("://")?;
    let valid = !scheme.is_empty()
        && !rest.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}
