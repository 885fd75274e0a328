use forge_env::EnvVarError;
use thiserror::Error;

use crate::Dtype;

/// Failures constructing or reinterpreting a typed tensor.
#[derive(Debug, Error)]
pub enum TensorError {
    #[error("Malformed {layout} data: {reason}")]
    MalformedLayout { layout: &'static str, reason: String },
    #[error("Size mismatch for {dtype} tensor: expected {expected} bytes, got {actual}")]
    SizeMismatch { dtype: Dtype, expected: usize, actual: usize },
    #[error("Dtype mismatch: tensor holds {actual}, requested {requested}")]
    DtypeMismatch { requested: Dtype, actual: Dtype },
    #[error("Tensor bytes are not aligned for {dtype} access")]
    Misaligned { dtype: Dtype },
    #[error("{0} is not a plain floating-point dtype")]
    NotPlain(Dtype),
    #[error("No block layout registered for {0}")]
    NoLayout(Dtype),
    #[error("Invalid shape {shape:?}: dimensions must be positive and their product must fit in usize")]
    InvalidShape { shape: Vec<usize> },
    #[error("{layout} does not support {operation}")]
    UnsupportedOperation { layout: &'static str, operation: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThetaError {
    #[error("Tensor not found: {0}")]
    NotFound(String),
    #[error("Duplicate tensor name: {0}")]
    Duplicate(String),
}

/// Errors reported by an operator set backend.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Public failure surface of every model loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Unreadable or truncated file. Truncation carries
    /// `ErrorKind::UnexpectedEof` and names what was being read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed archive record '{record}': {reason}")]
    MalformedArchive { record: String, reason: String },
    #[error("Unsupported tensor type {tag} for tensor '{tensor}'")]
    UnsupportedType { tensor: String, tag: String },
    #[error("Invalid parameter collection: {0}")]
    Theta(#[from] ThetaError),
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
    #[error("Invalid loader configuration: {0}")]
    Config(#[from] EnvVarError),
}
