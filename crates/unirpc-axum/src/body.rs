//! Best-effort retrieval of a body decoded by earlier middleware.

use http::Extensions;
use serde_json::Value;

/// A decoded request body left behind by an upstream body-parsing
/// middleware for downstream consumers.
///
/// Insert one into the request's extensions before the bridge runs and
/// the matched handler receives the value directly instead of consuming
/// the raw body stream a second time.
#[derive(Debug, Clone)]
pub struct PreparsedBody(
    /// The decoded body value.
    pub Value,
);

/// Read a previously parsed body, if any.
///
/// `null` is treated the same as absent so a decoded JSON `null` never
/// masquerades as a meaningful payload. Pure read; no mutation, no I/O.
pub(crate) fn preparsed_body(extensions: &Extensions) -> Option<Value> {
    match extensions.get::<PreparsedBody>() {
        None | Some(PreparsedBody(Value::Null)) => None,
        Some(PreparsedBody(value)) => Some(value.clone()),
    }
}
