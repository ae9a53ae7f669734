//! End-to-end bridge dispatch tests.
//!
//! Drives a real axum `Router` through `tower::ServiceExt::oneshot`:
//! route hits and misses, context propagation, preparsed bodies, failure
//! classification, and compression negotiation all without a socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Method, Request, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing::instrument::WithSubscriber;

use unirpc_axum::{BridgeOptions, HttpContext, PreparsedBody, RpcBridgeLayer, http_context_key};
use unirpc_core::{CallContext, ContextKey, RouterOptions, RpcError};

#[derive(Debug, Clone, PartialEq)]
struct RequestId(String);

#[derive(Debug, Deserialize)]
struct SayRequest {
    sentence: String,
}

#[derive(Debug, Serialize)]
struct SayResponse {
    sentence: String,
}

const ELIZA_SAY: &str = "/connectrpc.eliza.v1.ElizaService/Say";

/// Bridge serving the echo method; the handler stamps the request id it
/// observes through the context value bag into its reply.
fn eliza_bridge(key: ContextKey<HttpContext>, prefix: &str) -> RpcBridgeLayer {
    RpcBridgeLayer::new(
        BridgeOptions::new(key).with_prefix(prefix),
        |router| {
            router.service("connectrpc.eliza.v1.ElizaService", |svc| {
                svc.unary("Say", move |req: SayRequest, ctx: CallContext| async move {
                    let request_id = ctx
                        .values()
                        .get(key)
                        .and_then(|http| http.get::<RequestId>())
                        .map(|id| id.0.clone())
                        .unwrap_or_default();
                    Ok(SayResponse {
                        sentence: format!("You said: {:?} (request id: {request_id})", req.sentence),
                    })
                });
            });
        },
    )
    .unwrap()
}

/// App with a hit-counting fallback standing in for downstream middleware.
fn sentinel_app(bridge: RpcBridgeLayer, downstream_hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .fallback(move || {
            let hits = Arc::clone(&downstream_hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::NOT_FOUND, "downstream")
            }
        })
        .layer(bridge)
}

fn say_request(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_hit_dispatches_and_downstream_never_runs() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::clone(&hits));

    let response = app
        .oneshot(say_request(ELIZA_SAY, r#"{"sentence":"Hello!"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains(r#"You said: \"Hello!\""#), "body: {body}");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_miss_falls_through_to_downstream() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::clone(&hits));

    let response = app
        .oneshot(say_request("/not/a/route", r#"{"sentence":"Hello!"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "downstream");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_prefix_shifts_the_served_path() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = sentinel_app(
        eliza_bridge(http_context_key(), "/connectrpc"),
        Arc::clone(&hits),
    );

    let prefixed = format!("/connectrpc{ELIZA_SAY}");
    let response = app
        .clone()
        .oneshot(say_request(&prefixed, r#"{"sentence":"Hello!"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The unprefixed path is no longer served.
    let response = app
        .oneshot(say_request(ELIZA_SAY, r#"{"sentence":"Hello!"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_query_string_is_ignored_for_matching() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::clone(&hits));

    let with_query = format!("{ELIZA_SAY}?debug=1");
    let response = app
        .oneshot(say_request(&with_query, r#"{"sentence":"Hello!"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_context_value_reaches_the_handler() {
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri(ELIZA_SAY)
        .header(header::CONTENT_TYPE, "application/json")
        .extension(RequestId("req-abc-123".into()))
        .body(Body::from(r#"{"sentence":"Hi"}"#))
        .unwrap();

    let body = body_string(app.oneshot(request).await.unwrap()).await;
    assert!(body.contains("req-abc-123"), "body: {body}");
}

#[tokio::test]
async fn test_concurrent_requests_observe_only_their_own_values() {
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::default());

    let request_with_id = |id: &str| {
        Request::builder()
            .method(Method::POST)
            .uri(ELIZA_SAY)
            .header(header::CONTENT_TYPE, "application/json")
            .extension(RequestId(id.into()))
            .body(Body::from(r#"{"sentence":"Hi"}"#))
            .unwrap()
    };

    let (first, second) = tokio::join!(
        app.clone().oneshot(request_with_id("req-one")),
        app.clone().oneshot(request_with_id("req-two")),
    );

    let first = body_string(first.unwrap()).await;
    let second = body_string(second.unwrap()).await;
    assert!(first.contains("req-one") && !first.contains("req-two"));
    assert!(second.contains("req-two") && !second.contains("req-one"));
}

#[tokio::test]
async fn test_preparsed_body_is_used_instead_of_the_stream() {
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri(ELIZA_SAY)
        .header(header::CONTENT_TYPE, "application/json")
        .extension(PreparsedBody(json!({ "sentence": "Hi" })))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains(r#"You said: \"Hi\""#), "body: {body}");
}

#[tokio::test]
async fn test_preparsed_null_is_absent_and_empty_body_fails_cleanly() {
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::default());

    // A null preparsed value must not be forwarded as a payload; the
    // exhausted raw body then fails decoding instead of hanging.
    let request = Request::builder()
        .method(Method::POST)
        .uri(ELIZA_SAY)
        .header(header::CONTENT_TYPE, "application/json")
        .extension(PreparsedBody(Value::Null))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["code"], "invalid_argument");
}

/// Bridge whose single method fails with the given error.
fn failing_bridge(err: fn() -> RpcError) -> RpcBridgeLayer {
    RpcBridgeLayer::new(BridgeOptions::new(http_context_key()), move |router| {
        router.service("test.v1.FailService", |svc| {
            svc.unary("Fail", move |_: Value, _ctx: CallContext| async move {
                Err::<Value, _>(err())
            });
        });
    })
    .unwrap()
}

fn fail_request() -> Request<Body> {
    say_request("/test.v1.FailService/Fail", "{}")
}

/// Capturing writer so tests can assert on emitted log lines.
#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl CaptureWriter {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_aborted_rejection_is_suppressed_silently() {
    let app = sentinel_app(
        failing_bridge(|| RpcError::aborted("client went away")),
        Arc::default(),
    );
    let writer = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .finish();

    let response = async { app.oneshot(fail_request()).await }
        .with_subscriber(subscriber)
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 499);
    assert!(body_string(response).await.is_empty());
    assert_eq!(writer.contents(), "");
}

#[tokio::test]
async fn test_failed_rejection_is_logged_once_and_encoded_once() {
    let app = sentinel_app(
        failing_bridge(|| RpcError::internal("boom")),
        Arc::default(),
    );
    let writer = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .finish();

    let response = async { app.oneshot(fail_request()).await }
        .with_subscriber(subscriber)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["code"], "internal");
    assert_eq!(body["message"], "boom");

    let logs = writer.contents();
    assert_eq!(logs.matches("rpc handler failed").count(), 1, "logs: {logs}");
    assert!(logs.contains("test.v1.FailService"), "logs: {logs}");
    assert!(logs.contains("Fail"), "logs: {logs}");
}

#[tokio::test]
async fn test_gzip_request_body_is_decompressed() {
    use std::io::Write;

    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::default());

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(br#"{"sentence":"zipped"}"#).unwrap();
    let compressed = encoder.finish().unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri(ELIZA_SAY)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_ENCODING, "gzip")
        .body(Body::from(compressed))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains(r#"You said: \"zipped\""#), "body: {body}");
}

#[tokio::test]
async fn test_response_compression_is_negotiated_through_the_bridge() {
    use std::io::Read;

    let key = http_context_key();
    let bridge = RpcBridgeLayer::new(
        BridgeOptions::new(key).with_router_options(RouterOptions {
            min_compress_bytes: 1,
            ..RouterOptions::default()
        }),
        |router| {
            router.service("connectrpc.eliza.v1.ElizaService", |svc| {
                svc.unary("Say", |req: SayRequest, _ctx: CallContext| async move {
                    Ok(SayResponse {
                        sentence: format!("You said: {:?}", req.sentence),
                    })
                });
            });
        },
    )
    .unwrap();
    let app = sentinel_app(bridge, Arc::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri(ELIZA_SAY)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_ENCODING, "br")
        .body(Body::from(r#"{"sentence":"Hello!"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_ENCODING).unwrap(),
        "br"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut decoded = Vec::new();
    brotli::Decompressor::new(&bytes[..], 4096)
        .read_to_end(&mut decoded)
        .unwrap();
    let body: Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(body["sentence"], "You said: \"Hello!\"");
}

/// Bridge whose echo handler replies with a fixed tag.
fn tagged_bridge(tag: &'static str) -> RpcBridgeLayer {
    RpcBridgeLayer::new(BridgeOptions::new(http_context_key()), move |router| {
        router.service("connectrpc.eliza.v1.ElizaService", |svc| {
            svc.unary("Say", move |_: Value, _ctx: CallContext| async move {
                Ok(json!({ "sentence": tag }))
            });
        });
    })
    .unwrap()
}

#[tokio::test]
async fn test_outermost_bridge_instance_claims_a_shared_path() {
    // Layers added later sit further out in the chain and run first; each
    // instance has its own table and tables are never merged.
    let app = Router::new()
        .fallback(|| async { (StatusCode::NOT_FOUND, "downstream") })
        .layer(tagged_bridge("inner"))
        .layer(tagged_bridge("outer"));

    let response = app.oneshot(say_request(ELIZA_SAY, "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("outer") && !body.contains("inner"), "body: {body}");
}

#[tokio::test]
async fn test_get_on_rpc_path_is_method_not_allowed() {
    let app = sentinel_app(eliza_bridge(http_context_key(), ""), Arc::default());

    let request = Request::builder()
        .method(Method::GET)
        .uri(ELIZA_SAY)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
}
