//! Transport-agnostic response envelope.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde_json::json;

use crate::error::RpcError;

/// Transport-agnostic result of one RPC call: status, header set, and a
/// complete body. Transports convert this into their native response form
/// in a single step.
#[derive(Debug, Clone)]
pub struct UniversalResponse {
    /// HTTP status of the result.
    pub status: StatusCode,
    /// Response header set.
    pub headers: HeaderMap,
    /// Complete response body.
    pub body: Bytes,
}

impl UniversalResponse {
    /// An empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// A `200` response carrying an already-encoded payload.
    pub fn encoded(body: impl Into<Bytes>, content_type: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self {
            status: StatusCode::OK,
            headers,
            body: body.into(),
        }
    }

    /// Encode a classified failure: HTTP status from the code table, JSON
    /// body carrying the code's wire name and the message.
    pub fn from_error(error: &RpcError) -> Self {
        let body = serde_json::to_vec(&json!({
            "code": error.code().as_str(),
            "message": error.message(),
        }))
        .unwrap_or_default();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            status: error.code().http_status(),
            headers,
            body: Bytes::from(body),
        }
    }

    /// HTTP-level rejection for a verb the RPC surface does not accept.
    pub fn method_not_allowed() -> Self {
        let mut response = Self::new(StatusCode::METHOD_NOT_ALLOWED);
        response
            .headers
            .insert(header::ALLOW, HeaderValue::from_static("POST"));
        response
    }

    /// HTTP-level rejection for an unsupported request content type.
    pub fn unsupported_media_type() -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }
}
