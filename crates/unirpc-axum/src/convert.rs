//! Conversions between the native and universal representations.

use axum::body::Body;
use axum::response::Response;
use futures::{StreamExt, TryStreamExt};
use http::request::Parts;
use serde_json::Value;

use unirpc_core::{BoxError, ContextValues, RequestBody, UniversalRequest, UniversalResponse};

/// Assemble the transport-agnostic request envelope from the native
/// request's parts and body.
///
/// A preparsed value short-circuits body consumption entirely; otherwise
/// the native body is handed over as a raw stream for the handler to
/// drain.
pub(crate) fn universal_request(
    parts: &Parts,
    body: Body,
    preparsed: Option<Value>,
    values: ContextValues,
) -> UniversalRequest {
    let body = match preparsed {
        Some(value) => RequestBody::Parsed(value),
        None => RequestBody::Stream(
            body.into_data_stream()
                .map_err(|err| Box::new(err) as BoxError)
                .boxed(),
        ),
    };
    UniversalRequest::new(parts.method.clone(), parts.uri.path(), parts.headers.clone())
        .with_body(body)
        .with_values(values)
}

/// Write the universal response back in the native representation.
pub(crate) fn into_response(response: UniversalResponse) -> Response {
    let UniversalResponse {
        status,
        headers,
        body,
    } = response;
    let mut native = Response::new(Body::from(body));
    *native.status_mut() = status;
    *native.headers_mut() = headers;
    native
}
