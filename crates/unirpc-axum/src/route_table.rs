//! Exact-path route table.

use std::collections::HashMap;
use std::sync::Arc;

use unirpc_core::{CompiledHandler, RouterOptions, RpcRouter};

use crate::error::BridgeError;

/// Immutable mapping from exact request path to compiled handler.
///
/// Built once when the bridge layer is constructed and shared read-only
/// across all concurrent requests. Matching is exact string equality,
/// case-sensitive, with no wildcard or parameter segments; rebuilding
/// means constructing a new table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Arc<CompiledHandler>>,
}

impl RouteTable {
    /// Build the table by running the registration callback against a
    /// fresh router, then prefixing every compiled path.
    ///
    /// # Errors
    ///
    /// [`BridgeError::DuplicatePath`] when two methods resolve to the
    /// same final path. Zero registrations yield an empty, always-miss
    /// table.
    pub fn build(
        options: RouterOptions,
        prefix: &str,
        routes: impl FnOnce(&mut RpcRouter),
    ) -> Result<Self, BridgeError> {
        let mut router = RpcRouter::new(options);
        routes(&mut router);
        let mut table = HashMap::new();
        for handler in router.into_handlers() {
            let path = format!("{prefix}{}", handler.request_path());
            if table.insert(path.clone(), Arc::new(handler)).is_some() {
                return Err(BridgeError::DuplicatePath { path });
            }
        }
        Ok(Self { routes: table })
    }

    /// Exact lookup. Callers must strip the query string first.
    pub fn get(&self, path: &str) -> Option<&Arc<CompiledHandler>> {
        self.routes.get(path)
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when no method is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
