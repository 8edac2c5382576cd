//! Serialization and deserialization for the Tasklane wire contract.
//!
//! The sync layer this engine feeds is JSON-based, so the codec is a thin
//! wrapper over `serde_json` with a structured error type. Decoding
//! arbitrary bytes returns an error, never panics.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("encode error: {0}")]
    Encode(String),
    /// Deserialization failed.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Encodes a wire value into JSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the value cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decodes a wire value from JSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the bytes are not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
