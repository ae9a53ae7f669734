//! Transport-agnostic request envelope.

use std::fmt;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use http::{HeaderMap, Method};
use serde_json::Value;

use crate::code::Code;
use crate::context::ContextValues;
use crate::error::{BoxError, RpcError};

/// The body of an in-flight call, as handed to a compiled handler.
pub enum RequestBody {
    /// Raw transport bytes, possibly compressed per `Content-Encoding`.
    Stream(BoxStream<'static, Result<Bytes, BoxError>>),
    /// A value an upstream component already decoded.
    Parsed(Value),
    /// No body.
    Empty,
}

impl RequestBody {
    /// Collect the raw body into contiguous bytes.
    ///
    /// An exhausted stream yields empty bytes rather than blocking, so a
    /// body consumed upstream still terminates promptly.
    ///
    /// # Errors
    ///
    /// A transport failure mid-stream classifies as [`Code::Aborted`]: the
    /// peer tore the connection down. Calling this on an already-decoded
    /// body is a framework bug and classifies as [`Code::Internal`].
    pub async fn into_bytes(self) -> Result<Bytes, RpcError> {
        match self {
            Self::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|err| {
                        RpcError::new(Code::Aborted, "request body read failed").with_source(err)
                    })?;
                    buf.extend_from_slice(&chunk);
                }
                Ok(Bytes::from(buf))
            }
            Self::Parsed(_) => Err(RpcError::new(
                Code::Internal,
                "request body was already decoded",
            )),
            Self::Empty => Ok(Bytes::new()),
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Parsed(value) => f.debug_tuple("Parsed").field(value).finish(),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

/// Transport-agnostic representation of one RPC call.
///
/// Assembled by a transport bridge from its native request form; the RPC
/// layer only reads the envelope, never the native request.
#[derive(Debug)]
pub struct UniversalRequest {
    /// HTTP verb of the call.
    pub method: Method,
    /// Request path, query string excluded.
    pub path: String,
    /// Request header set.
    pub headers: HeaderMap,
    /// Body stream or pre-decoded value.
    pub body: RequestBody,
    /// Out-of-band values injected by the hosting framework.
    pub values: ContextValues,
}

impl UniversalRequest {
    /// Create an envelope with an empty body and no context values.
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body: RequestBody::Empty,
            values: ContextValues::new(),
        }
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Set the context value bag.
    #[must_use]
    pub fn with_values(mut self, values: ContextValues) -> Self {
        self.values = values;
        self
    }
}
