//! Error types for the resource index.

use pedia_core::SelectorError;
use thiserror::Error;

use crate::codec::CodecError;

/// Result type alias for index operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid object: {0}")]
    InvalidObject(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("no resource storage registered for {0}")]
    StorageNotRegistered(String),

    #[error("storage lock poisoned")]
    LockPoisoned,
}
