//! Error taxonomy for extraction sessions
//!
//! `InvalidArgument` and `NotImplemented` are returned synchronously by
//! [`SourceReader::produce`](crate::SourceReader::produce) before anything is
//! opened. `ResourceOpen` and `ResourceRead` only ever arrive as the terminal
//! item of a [`RecordStream`](crate::RecordStream).

use thiserror::Error;

/// Coarse classification of an [`ExtractError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    ResourceOpen,
    ResourceRead,
    NotImplemented,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::ResourceOpen => write!(f, "resource open"),
            Self::ResourceRead => write!(f, "resource read"),
            Self::NotImplemented => write!(f, "not implemented"),
        }
    }
}

/// Error produced by a source reader
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// Malformed or missing descriptor field
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The file could not be opened or the connection could not be established
    #[error("Failed to open {resource}: {message}")]
    ResourceOpen { resource: String, message: String },

    /// Read, decode or cursor fault after the resource was opened
    #[error("Failed to read {resource}: {message}")]
    ResourceRead { resource: String, message: String },

    /// The requested source variant has no extractor yet
    #[error("{0} extraction is not implemented")]
    NotImplemented(String),
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::ResourceOpen { .. } => ErrorKind::ResourceOpen,
            Self::ResourceRead { .. } => ErrorKind::ResourceRead,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn open(resource: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ResourceOpen {
            resource: resource.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn read(resource: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ResourceRead {
            resource: resource.into(),
            message: err.to_string(),
        }
    }
}
