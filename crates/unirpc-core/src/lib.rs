//! # unirpc-core
//!
//! Transport-agnostic RPC handler layer. This crate defines the pieces a
//! transport bridge needs to host RPC methods without knowing anything
//! about the hosting HTTP framework:
//!
//! - [`Code`] / [`RpcError`] - the closed status-code space and the
//!   structured error every failure normalizes into
//! - [`ContextKey`] / [`ContextValues`] - identity-keyed, request-scoped
//!   value passing between a host framework and method handlers
//! - [`UniversalRequest`] / [`UniversalResponse`] - envelope types for an
//!   in-flight call, independent of the underlying HTTP library
//! - [`RpcRouter`] - compiles service registrations into path-bound
//!   handlers a transport can mount
//! - [`Codec`] - the wire encoding seam ([`JsonCodec`] ships)
//! - [`Encoding`] - accepted compression schemes and content negotiation
//!
//! # Design Philosophy
//!
//! Handlers are compiled once at startup and shared read-only afterwards;
//! everything per-request is owned by that request's task. The crate never
//! inspects RPC payload semantics beyond decode/encode - it assembles and
//! disassembles envelopes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod code;
pub mod codec;
pub mod compression;
pub mod context;
pub mod error;
pub mod request;
pub mod response;
pub mod router;

pub use code::Code;
pub use codec::{Codec, JsonCodec};
pub use compression::Encoding;
pub use context::{ContextKey, ContextValues};
pub use error::{BoxError, RpcError, RpcResult};
pub use request::{RequestBody, UniversalRequest};
pub use response::UniversalResponse;
pub use router::{CallContext, CompiledHandler, RouterOptions, RpcRouter, ServiceRegistrar};
