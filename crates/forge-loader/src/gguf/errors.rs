use std::io;

use forge_sdk::{LoaderError, ThetaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GGUFError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Archive truncated while reading {location}")]
    Truncated { location: String },
    #[error("Invalid magic number {0:?}")]
    InvalidMagic([u8; 4]),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid data in {location}: {reason}")]
    InvalidData { location: String, reason: String },
    #[error("Malformed tensor '{tensor}': {reason}")]
    MalformedArchive { tensor: String, reason: String },
    #[error("Unsupported tensor type {tag} for tensor '{tensor}'")]
    UnsupportedType { tensor: String, tag: String },
    #[error("Memory mapping error: {0}")]
    MemoryMappingError(String),
    #[error(transparent)]
    Theta(#[from] ThetaError),
}

impl GGUFError {
    pub(crate) fn invalid(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(tensor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedArchive {
            tensor: tensor.into(),
            reason: reason.into(),
        }
    }
}

/// Tags a short read with the record being decoded.
pub(crate) trait ReadContext<T> {
    fn context(self, location: impl FnOnce() -> String) -> Result<T, GGUFError>;
}

impl<T> ReadContext<T> for io::Result<T> {
    fn context(self, location: impl FnOnce() -> String) -> Result<T, GGUFError> {
        self.map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => GGUFError::Truncated { location: location() },
            _ => GGUFError::Io(err),
        })
    }
}

impl From<GGUFError> for LoaderError {
    fn from(err: GGUFError) -> Self {
        match err {
            GGUFError::Io(err) => LoaderError::Io(err),
            GGUFError::Truncated { location } => {
                LoaderError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, format!("archive truncated while reading {location}")))
            }
            GGUFError::InvalidMagic(magic) => LoaderError::UnsupportedFormat(format!("not a GGUF archive (magic {magic:?})")),
            GGUFError::UnsupportedVersion(version) => LoaderError::UnsupportedFormat(format!("GGUF version {version}")),
            GGUFError::InvalidData { location, reason } => LoaderError::MalformedArchive { record: location, reason },
            GGUFError::MalformedArchive { tensor, reason } => LoaderError::MalformedArchive { record: tensor, reason },
            GGUFError::UnsupportedType { tensor, tag } => LoaderError::UnsupportedType { tensor, tag },
            GGUFError::MemoryMappingError(message) => LoaderError::Io(io::Error::other(message)),
            GGUFError::Theta(err) => LoaderError::Theta(err),
        }
    }
}
