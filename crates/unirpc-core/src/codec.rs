//! Wire encoding seam.
//!
//! The router encodes and decodes messages through a [`Codec`] so
//! alternative wire formats can slot in without touching dispatch.
//! [`JsonCodec`] is the shipped implementation.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::code::Code;
use crate::error::RpcError;

/// Message encoding/decoding for one wire format.
pub trait Codec: Send + Sync {
    /// The `Content-Type` this codec produces and accepts.
    fn content_type(&self) -> &'static str;

    /// Encode a response message to wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Code::Internal`] when the message cannot be serialized.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, RpcError>;

    /// Decode a request message from wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Code::InvalidArgument`] when the bytes do not decode.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, RpcError>;
}

/// JSON wire format backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a JSON codec.
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, RpcError> {
        serde_json::to_vec(value)
            .map_err(|err| RpcError::new(Code::Internal, format!("response encoding failed: {err}")))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, RpcError> {
        serde_json::from_slice(bytes).map_err(RpcError::from)
    }
}
