//! # unirpc-axum
//!
//! Bridging middleware that mounts unirpc RPC handlers inside an axum
//! middleware chain. The bridge reconciles two abstractions without
//! either knowing about the other: axum's tower service pipeline on one
//! side, the transport-agnostic universal handler contract of
//! `unirpc-core` on the other.
//!
//! For each incoming request the bridge looks the exact path up in an
//! immutable route table compiled at startup. A miss passes the request
//! to the inner service untouched; a hit converts the native request into
//! a universal one (injecting a snapshot of the native per-request state
//! into the call's context values), awaits the compiled handler, and
//! converts the result back. Failures are classified: a client-initiated
//! abort is suppressed silently, everything else is logged once and
//! encoded once.
//!
//! # Example
//!
//! ```rust,ignore
//! let key = http_context_key();
//! let bridge = RpcBridgeLayer::new(BridgeOptions::new(key), |router| {
//!     router.service("connectrpc.eliza.v1.ElizaService", |svc| {
//!         svc.unary("Say", move |req: SayRequest, ctx: CallContext| async move {
//!             let request_id = ctx
//!                 .values()
//!                 .get(key)
//!                 .and_then(|http| http.get::<RequestId>());
//!             Ok(SayResponse { sentence: format!("You said: {:?}", req.sentence) })
//!         });
//!     });
//! })?;
//!
//! let app = Router::new().fallback(not_found).layer(bridge);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod body;
mod context;
mod convert;
mod error;
mod layer;
mod route_table;
mod service;

pub use body::PreparsedBody;
pub use context::{HttpContext, http_context_key};
pub use error::BridgeError;
pub use layer::{BridgeOptions, RpcBridgeLayer};
pub use route_table::RouteTable;
pub use service::RpcBridgeService;
