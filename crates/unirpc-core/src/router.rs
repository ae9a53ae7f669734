//! Service registration and handler compilation.
//!
//! An [`RpcRouter`] collects service declarations and compiles every
//! method into a [`CompiledHandler`] bound to its canonical request path
//! `/{fully.qualified.ServiceName}/{MethodName}`. Transports enumerate
//! the compiled handlers and mount them however they route requests.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderValue, Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::code::Code;
use crate::codec::{Codec, JsonCodec};
use crate::compression::{self, Encoding};
use crate::context::ContextValues;
use crate::error::{RpcError, RpcResult};
use crate::request::{RequestBody, UniversalRequest};
use crate::response::UniversalResponse;

/// Configuration applied to every handler the router compiles.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Schemes accepted for request decompression and offered for
    /// response compression.
    pub accept_compression: Vec<Encoding>,
    /// Response bodies below this size are sent identity-encoded.
    pub min_compress_bytes: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            accept_compression: vec![Encoding::Gzip, Encoding::Brotli],
            min_compress_bytes: 1024,
        }
    }
}

/// Per-call state handed to a method handler alongside the decoded
/// request message.
#[derive(Debug)]
pub struct CallContext {
    headers: HeaderMap,
    values: ContextValues,
}

impl CallContext {
    pub(crate) fn new(headers: HeaderMap, values: ContextValues) -> Self {
        Self { headers, values }
    }

    /// Request headers of the call.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Out-of-band values the hosting framework injected for this call.
    pub fn values(&self) -> &ContextValues {
        &self.values
    }
}

type UniversalHandlerFn =
    Arc<dyn Fn(UniversalRequest) -> BoxFuture<'static, Result<UniversalResponse, RpcError>> + Send + Sync>;

/// One method handler compiled to its request path, ready for a transport
/// to mount. Cheap to clone; shared read-only across requests.
#[derive(Clone)]
pub struct CompiledHandler {
    service: String,
    method: String,
    request_path: String,
    handler: UniversalHandlerFn,
}

impl CompiledHandler {
    /// Fully qualified service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Canonical request path, `/{service}/{method}`.
    pub fn request_path(&self) -> &str {
        &self.request_path
    }

    /// Run the compiled pipeline: decode, invoke, encode.
    ///
    /// # Errors
    ///
    /// Propagates the handler's classified failure, or the classification
    /// of a decode/transport problem. HTTP-level mismatches (verb, media
    /// type) resolve to `Ok` responses, not errors.
    pub async fn call(&self, request: UniversalRequest) -> Result<UniversalResponse, RpcError> {
        (self.handler)(request).await
    }
}

impl fmt::Debug for CompiledHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledHandler")
            .field("service", &self.service)
            .field("method", &self.method)
            .field("request_path", &self.request_path)
            .finish()
    }
}

/// Collects service registrations and compiles them into path-bound
/// handlers.
#[derive(Debug)]
pub struct RpcRouter {
    options: RouterOptions,
    handlers: Vec<CompiledHandler>,
}

impl RpcRouter {
    /// Create a router; the options apply to every compiled handler.
    pub fn new(options: RouterOptions) -> Self {
        Self {
            options,
            handlers: Vec::new(),
        }
    }

    /// Declare one service. The callback registers the service's methods
    /// against the provided [`ServiceRegistrar`].
    pub fn service(
        &mut self,
        type_name: impl Into<String>,
        register: impl FnOnce(&mut ServiceRegistrar<'_>),
    ) -> &mut Self {
        let mut registrar = ServiceRegistrar {
            type_name: type_name.into(),
            options: self.options.clone(),
            handlers: &mut self.handlers,
        };
        register(&mut registrar);
        self
    }

    /// The handlers compiled so far.
    pub fn handlers(&self) -> &[CompiledHandler] {
        &self.handlers
    }

    /// Consume the router, yielding the compiled handlers.
    pub fn into_handlers(self) -> Vec<CompiledHandler> {
        self.handlers
    }
}

/// Registers methods for one declared service.
pub struct ServiceRegistrar<'a> {
    type_name: String,
    options: RouterOptions,
    handlers: &'a mut Vec<CompiledHandler>,
}

impl ServiceRegistrar<'_> {
    /// Register a unary method.
    ///
    /// The handler receives the decoded request message and a
    /// [`CallContext`]; its result is encoded back onto the wire. A
    /// returned [`RpcError`] propagates to the transport unchanged.
    pub fn unary<Req, Res, F, Fut>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Res>> + Send + 'static,
    {
        let method = method.into();
        let service = self.type_name.clone();
        let request_path = format!("/{service}/{method}");
        let options = self.options.clone();
        let handler = Arc::new(handler);
        let call: UniversalHandlerFn = Arc::new(
            move |request: UniversalRequest| -> BoxFuture<'static, Result<UniversalResponse, RpcError>> {
                Box::pin(unary_call(request, options.clone(), Arc::clone(&handler)))
            },
        );
        self.handlers.push(CompiledHandler {
            service,
            method,
            request_path,
            handler: call,
        });
        self
    }
}

impl fmt::Debug for ServiceRegistrar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistrar")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// The compiled unary pipeline: negotiate, decode, invoke, encode.
async fn unary_call<Req, Res, F, Fut>(
    request: UniversalRequest,
    options: RouterOptions,
    handler: Arc<F>,
) -> Result<UniversalResponse, RpcError>
where
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
    F: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Res>> + Send + 'static,
{
    let codec = JsonCodec::new();

    if request.method != Method::POST {
        return Ok(UniversalResponse::method_not_allowed());
    }
    if !content_type_matches(&request.headers, codec.content_type()) {
        return Ok(UniversalResponse::unsupported_media_type());
    }

    let UniversalRequest {
        headers,
        body,
        values,
        ..
    } = request;

    let message: Req = match body {
        RequestBody::Parsed(value) => serde_json::from_value(value).map_err(RpcError::from)?,
        raw => {
            let bytes = raw.into_bytes().await?;
            let bytes = decode_content_encoding(&headers, bytes, &options.accept_compression)?;
            codec.decode(&bytes)?
        }
    };

    let accept_encoding = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let ctx = CallContext::new(headers, values);
    let reply = (*handler)(message, ctx).await?;
    let payload = codec.encode(&reply)?;
    let mut response = UniversalResponse::encoded(payload, codec.content_type());

    if response.body.len() >= options.min_compress_bytes
        && let Some(encoding) =
            compression::negotiate(accept_encoding.as_deref(), &options.accept_compression)
    {
        let compressed = encoding.compress(&response.body).map_err(|err| {
            RpcError::new(Code::Internal, format!("response compression failed: {err}"))
        })?;
        response.body = Bytes::from(compressed);
        response
            .headers
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static(encoding.name()));
    }

    Ok(response)
}

/// True when the request either omits `Content-Type` or names the codec's
/// media type (parameters such as `charset` ignored).
fn content_type_matches(headers: &HeaderMap, expected: &str) -> bool {
    match headers.get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.split(';').next())
            .is_some_and(|media| media.trim().eq_ignore_ascii_case(expected)),
    }
}

/// Undo the request's `Content-Encoding`, if any.
fn decode_content_encoding(
    headers: &HeaderMap,
    raw: Bytes,
    accepted: &[Encoding],
) -> Result<Bytes, RpcError> {
    let Some(value) = headers.get(header::CONTENT_ENCODING) else {
        return Ok(raw);
    };
    let name = value
        .to_str()
        .map_err(|_| RpcError::invalid_argument("malformed content-encoding header"))?
        .trim();
    if name.is_empty() || name.eq_ignore_ascii_case("identity") {
        return Ok(raw);
    }
    let encoding = Encoding::from_name(name)
        .filter(|encoding| accepted.contains(encoding))
        .ok_or_else(|| {
            RpcError::new(
                Code::Unimplemented,
                format!("unsupported content-encoding {name:?}"),
            )
        })?;
    let decoded = encoding.decompress(&raw).map_err(|err| {
        RpcError::invalid_argument(format!("request decompression failed: {err}"))
    })?;
    Ok(Bytes::from(decoded))
}
