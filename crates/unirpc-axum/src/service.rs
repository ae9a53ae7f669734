//! The bridging middleware: a tower service dispatching matched requests
//! to compiled RPC handlers.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::Response;
use futures::future::BoxFuture;
use http::{Request, StatusCode};
use tower::Service;
use tracing::error;

use unirpc_core::{Code, CompiledHandler, ContextValues, UniversalResponse};

use crate::body::preparsed_body;
use crate::context::HttpContext;
use crate::convert::{into_response, universal_request};
use crate::layer::BridgeState;

/// Nginx's convention for "the client closed the connection before the
/// response"; nothing standard exists and nobody observes it anyway.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Tower service that routes matching requests to compiled RPC handlers
/// and passes everything else to the inner service unchanged.
#[derive(Debug, Clone)]
pub struct RpcBridgeService<S> {
    inner: S,
    state: Arc<BridgeState>,
}

impl<S> RpcBridgeService<S> {
    pub(crate) fn new(inner: S, state: Arc<BridgeState>) -> Self {
        Self { inner, state }
    }

    /// The wrapped inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> Service<Request<Body>> for RpcBridgeService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // `Uri::path` excludes the query string, so the table only ever
        // sees bare paths.
        let Some(handler) = self.state.table.get(req.uri().path()).cloned() else {
            let clone = self.inner.clone();
            let mut inner = std::mem::replace(&mut self.inner, clone);
            return Box::pin(async move { inner.call(req).await });
        };
        let state = Arc::clone(&self.state);
        Box::pin(async move { Ok(dispatch(&handler, &state, req).await) })
    }
}

/// Run one matched request through the universal handler and map the
/// outcome back onto HTTP semantics.
async fn dispatch(
    handler: &CompiledHandler,
    state: &BridgeState,
    req: Request<Body>,
) -> Response {
    let (parts, body) = req.into_parts();
    let preparsed = preparsed_body(&parts.extensions);
    let values =
        ContextValues::new().with(state.context_key, HttpContext::from_parts(&parts));
    let request = universal_request(&parts, body, preparsed, values);

    match handler.call(request).await {
        Ok(response) => into_response(response),
        Err(err) if err.code() == Code::Aborted => {
            // The client tore the call down; the transport has already
            // observed the disconnect. Nothing to report, nothing to write.
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            response
        }
        Err(err) => {
            error!(
                service = handler.service(),
                method = handler.method(),
                error = %err,
                "rpc handler failed"
            );
            into_response(UniversalResponse::from_error(&err))
        }
    }
}
