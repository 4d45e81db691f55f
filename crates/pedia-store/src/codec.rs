//! Codec adapter between domain objects and stored bytes.
//!
//! The index never parses payloads itself. Every encode and decode goes
//! through the [`Codec`] handed to the storage at construction time, and
//! typed values cross that boundary as `serde_json::Value`.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Encode/decode capability injected into a storage.
pub trait Codec: Send + Sync {
    fn encode(&self, object: &Value) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError>;
}

/// Stores objects as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, object: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(object)?)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        Ok(serde_json::from_slice(data)?)
    }
}
