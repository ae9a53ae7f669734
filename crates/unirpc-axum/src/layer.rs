//! Tower layer mounting the bridge into an axum router.

use std::sync::Arc;

use tower::Layer;

use unirpc_core::{ContextKey, RouterOptions, RpcRouter};

use crate::context::HttpContext;
use crate::error::BridgeError;
use crate::route_table::RouteTable;
use crate::service::RpcBridgeService;

/// Configuration for mounting RPC routes inside an axum middleware chain.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Key under which each dispatched call can reach the native request
    /// state. Create once with
    /// [`http_context_key`](crate::http_context_key).
    pub context_key: ContextKey<HttpContext>,
    /// Serve every handler under this prefix. The prefix `"/api"` serves
    /// the RPC `foo.FooService/Bar` under `/api/foo.FooService/Bar`.
    /// Note that many RPC client implementations do not allow prefixes.
    pub prefix: String,
    /// Options forwarded to router construction: accepted compression
    /// schemes and the response compression threshold.
    pub router: RouterOptions,
}

impl BridgeOptions {
    /// Options with no prefix and the default router configuration
    /// (gzip and brotli accepted).
    pub fn new(context_key: ContextKey<HttpContext>) -> Self {
        Self {
            context_key,
            prefix: String::new(),
            router: RouterOptions::default(),
        }
    }

    /// Set the request path prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Override the router options.
    #[must_use]
    pub fn with_router_options(mut self, router: RouterOptions) -> Self {
        self.router = router;
        self
    }
}

#[derive(Debug)]
pub(crate) struct BridgeState {
    pub(crate) table: RouteTable,
    pub(crate) context_key: ContextKey<HttpContext>,
}

/// Tower layer inserting the bridging middleware into an axum router.
///
/// Each layer instance owns one immutable route table; mounting the same
/// path in two instances means only the outermost one ever observes it.
#[derive(Debug, Clone)]
pub struct RpcBridgeLayer {
    state: Arc<BridgeState>,
}

impl RpcBridgeLayer {
    /// Run the registration callback and compile the route table.
    ///
    /// # Errors
    ///
    /// [`BridgeError::DuplicatePath`] when two registered methods resolve
    /// to the same request path. Fatal at startup: the server must not
    /// come up with an ambiguous table.
    pub fn new(
        options: BridgeOptions,
        routes: impl FnOnce(&mut RpcRouter),
    ) -> Result<Self, BridgeError> {
        let table = RouteTable::build(options.router, &options.prefix, routes)?;
        Ok(Self {
            state: Arc::new(BridgeState {
                table,
                context_key: options.context_key,
            }),
        })
    }

    /// Paths served by this layer instance.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.state.table.paths()
    }
}

impl<S> Layer<S> for RpcBridgeLayer {
    type Service = RpcBridgeService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcBridgeService::new(inner, Arc::clone(&self.state))
    }
}
