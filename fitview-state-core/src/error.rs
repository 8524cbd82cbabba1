//! Error types shared by the store and its configuration

use thiserror::Error;

/// Error raised by a middleware or subscriber callback.
///
/// Callbacks report failure by returning `Err`; the store logs the error and
/// keeps going with the next callback.
pub type CallbackError = Box<dyn std::error::Error + 'static>;

/// Result type returned by middleware and subscriber callbacks.
pub type CallbackResult<T = ()> = std::result::Result<T, CallbackError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;
