//! Error types for the application layer

use thiserror::Error;

/// A file load that the caller needs to hear about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("invalid file data: {0}")]
    InvalidData(String),
    #[error("{0}")]
    Backend(String),
}

/// Failure while deriving data from a loaded file.
///
/// Never propagated out of the store pipeline; it ends up as a message in
/// `fitFile.processingError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("file data must be an object")]
    NotAnObject,
    #[error("`{field}` must be an array")]
    NotAnArray { field: &'static str },
    #[error("failed to serialize processed data: {0}")]
    Serialize(String),
}
