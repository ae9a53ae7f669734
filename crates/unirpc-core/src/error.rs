//! Structured RPC error type.
//!
//! [`RpcError`] is the single error type crossing the handler boundary.
//! Arbitrary failures are normalized into it with [`RpcError::from_reason`]
//! so transports can branch on [`Code`] instead of error identity.

use crate::code::Code;

/// Boxed error trait object used at crate boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// A classified RPC failure: a [`Code`] plus a human-readable message and
/// an optional source.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    code: Code,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl RpcError {
    /// Create an error with the given code and message.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// A [`Code::Aborted`] error (benign client-initiated teardown).
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(Code::Aborted, message)
    }

    /// A [`Code::Canceled`] error.
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(Code::Canceled, message)
    }

    /// A [`Code::InvalidArgument`] error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// A [`Code::NotFound`] error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// A [`Code::Unimplemented`] error.
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(Code::Unimplemented, message)
    }

    /// A [`Code::Internal`] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// A [`Code::Unavailable`] error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    /// The classification of this failure.
    pub fn code(&self) -> Code {
        self.code
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Normalize an arbitrary boxed failure into a structured error.
    ///
    /// A boxed [`RpcError`] keeps its classification; anything else is
    /// classified as [`Code::Unknown`] with the original failure retained
    /// as the source.
    pub fn from_reason(reason: BoxError) -> Self {
        match reason.downcast::<RpcError>() {
            Ok(err) => *err,
            Err(other) => Self {
                code: Code::Unknown,
                message: other.to_string(),
                source: Some(other),
            },
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(Code::InvalidArgument, err.to_string()).with_source(err)
    }
}
