//! Native per-request state exposed to RPC handlers.

use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri};

use unirpc_core::ContextKey;

/// Owned snapshot of the hosting framework's per-request state.
///
/// The bridge stores one of these in the call's context values under the
/// key configured in [`BridgeOptions`](crate::BridgeOptions), so handlers
/// can read request metadata and values attached by earlier middleware
/// without depending on axum themselves.
#[derive(Debug, Clone)]
pub struct HttpContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
}

impl HttpContext {
    pub(crate) fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            extensions: parts.extensions.clone(),
        }
    }

    /// HTTP verb of the native request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full URI of the native request.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path, query string excluded.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Native request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Typed read of a value an earlier middleware attached to the
    /// request (e.g. a generated request identifier).
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}

/// Create the process-wide key under which the bridge stores each call's
/// [`HttpContext`] snapshot.
///
/// Call once at startup and hand the key to both
/// [`BridgeOptions`](crate::BridgeOptions) and any handler that wants the
/// native state. Keys are identity-based: a second call yields an
/// unrelated key whose slot the bridge never fills.
pub fn http_context_key() -> ContextKey<HttpContext> {
    ContextKey::new()
}
