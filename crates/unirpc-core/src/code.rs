//! Canonical RPC status codes.
//!
//! Every failure that crosses the handler boundary is classified into
//! exactly one of these codes. The set is closed: transports branch on the
//! code (suppress, log, encode) rather than on error identity.

use core::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Closed set of RPC outcome codes.
///
/// The wire form is the snake_case name (`"invalid_argument"`); the HTTP
/// form is the fixed mapping in [`Code::http_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Code {
    /// The client canceled the call before a result was produced.
    Canceled,
    /// Failure that fits no other code.
    Unknown,
    /// The request message failed validation or decoding.
    InvalidArgument,
    /// The call outlived its deadline.
    DeadlineExceeded,
    /// The requested entity does not exist.
    NotFound,
    /// The entity to create already exists.
    AlreadyExists,
    /// The caller is not allowed to perform the operation.
    PermissionDenied,
    /// A quota or rate limit was exhausted.
    ResourceExhausted,
    /// System state does not allow the operation.
    FailedPrecondition,
    /// The call was torn down mid-flight, typically by a client disconnect.
    /// Transports treat this as benign.
    Aborted,
    /// A value fell outside the valid range.
    OutOfRange,
    /// The method or a required capability is not implemented.
    Unimplemented,
    /// Invariant broken inside the handler or the framework.
    Internal,
    /// The service is temporarily unable to process calls.
    Unavailable,
    /// Unrecoverable data loss or corruption.
    DataLoss,
    /// The caller did not authenticate.
    Unauthenticated,
}

impl Code {
    /// Returns the snake_case wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
            Self::InvalidArgument => "invalid_argument",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::ResourceExhausted => "resource_exhausted",
            Self::FailedPrecondition => "failed_precondition",
            Self::Aborted => "aborted",
            Self::OutOfRange => "out_of_range",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
            Self::DataLoss => "data_loss",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// The HTTP status a failure with this code is encoded under.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Canceled | Self::DeadlineExceeded => StatusCode::REQUEST_TIMEOUT,
            Self::InvalidArgument | Self::OutOfRange => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::Unimplemented => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::Aborted => StatusCode::CONFLICT,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            Self::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown | Self::Internal | Self::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
