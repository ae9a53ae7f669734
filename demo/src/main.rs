//! Echo server demo.
//!
//! An axum app serving plain REST routes alongside an RPC service
//! dispatched through the bridging middleware. A request-id middleware
//! runs first and attaches an identifier that the RPC handler reads back
//! through the call's context values.

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use unirpc_axum::{BridgeOptions, HttpContext, RpcBridgeLayer, http_context_key};
use unirpc_core::{CallContext, ContextKey};

/// Identifier attached to every request by [`request_id_middleware`].
#[derive(Debug, Clone)]
struct RequestId(String);

#[derive(Debug, Deserialize)]
struct SayRequest {
    sentence: String,
}

#[derive(Debug, Serialize)]
struct SayResponse {
    sentence: String,
}

async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(RequestId(uuid::Uuid::new_v4().to_string()));
    next.run(request).await
}

fn app(key: ContextKey<HttpContext>) -> anyhow::Result<Router> {
    let bridge = RpcBridgeLayer::new(BridgeOptions::new(key), |router| {
        router.service("connectrpc.eliza.v1.ElizaService", |svc| {
            svc.unary("Say", move |req: SayRequest, ctx: CallContext| async move {
                let request_id = ctx
                    .values()
                    .get(key)
                    .and_then(|http| http.get::<RequestId>())
                    .map(|id| id.0.clone())
                    .unwrap_or_default();
                info!(%request_id, "echoing sentence");
                Ok(SayResponse {
                    sentence: format!("You said: {:?} (request id: {request_id})", req.sentence),
                })
            });
        });
    })?;

    Ok(Router::new()
        .route("/", get(|| async { "Hello from axum with unirpc over HTTP!" }))
        .route(
            "/api/users",
            get(|| async {
                Json(json!({
                    "users": [
                        { "id": 1, "name": "John Doe" },
                        { "id": 2, "name": "Jane Doe" },
                    ]
                }))
            }),
        )
        .layer(bridge)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let key = http_context_key();
    let app = app(key)?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    info!("listening on http://{}", listener.local_addr()?);
    info!("rpc endpoint: POST http://127.0.0.1:3000/connectrpc.eliza.v1.ElizaService/Say");
    axum::serve(listener, app).await?;
    Ok(())
}
