//! Bridge construction errors.

/// Errors surfaced while building the bridge. All are configuration
/// problems and fatal at startup; none occur per-request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BridgeError {
    /// Two registered methods resolved to the same request path.
    #[error("duplicate rpc route {path:?}")]
    DuplicatePath {
        /// The colliding path, prefix included.
        path: String,
    },
}
