//! Error types for hawser.

use bytes::Bytes;
use derive_more::{Display, Error, From};

/// Maximum number of characters of an upstream body included in rendered
/// status-error messages. The full body stays available via [`Error::body`].
const BODY_EXCERPT_CHARS: usize = 512;

fn excerpt(body: &Bytes) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() <= BODY_EXCERPT_CHARS {
        text.into_owned()
    } else {
        let mut out: String = text.chars().take(BODY_EXCERPT_CHARS).collect();
        out.push_str("...");
        out
    }
}

/// Main error type for hawser operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Invalid or inconsistent configuration, surfaced at construction time.
    #[display("configuration error: {_0}")]
    #[from(skip)]
    Config(#[error(not(source))] String),

    /// A service name with no entry in the configured service map.
    #[display("unknown service: {name}")]
    #[from(skip)]
    UnknownService {
        /// The service name that was looked up.
        name: String,
    },

    /// A response whose status code failed validation.
    #[display("unexpected status {status} for {url}: {}", excerpt(body))]
    #[from(skip)]
    Status {
        /// Observed HTTP status code.
        status: u16,
        /// The request URL.
        url: String,
        /// The buffered upstream response body.
        #[error(not(source))]
        body: Bytes,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request construction.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// A one-shot stream body that would have to be replayed for a retry.
    #[display("request body cannot be replayed for a retry")]
    #[from(skip)]
    NonRetryableBody,

    /// All retry attempts exhausted; wraps the final attempt's error.
    #[display("retry failed after {attempts} attempts: {source}")]
    #[from(skip)]
    RetryExhausted {
        /// Number of retries performed (not counting the first attempt).
        attempts: u32,
        /// The final attempt's error.
        source: Box<Error>,
    },

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an unknown-service error.
    #[must_use]
    pub fn unknown_service(name: impl Into<String>) -> Self {
        Self::UnknownService { name: name.into() }
    }

    /// Create a status-validation error.
    #[must_use]
    pub fn status(status: u16, url: impl Into<String>, body: Bytes) -> Self {
        Self::Status {
            status,
            url: url.into(),
            body,
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Wrap the final attempt's error after exhausting retries.
    #[must_use]
    pub fn retry_exhausted(attempts: u32, source: Self) -> Self {
        Self::RetryExhausted {
            attempts,
            source: Box::new(source),
        }
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if this is a status-validation error.
    #[must_use]
    pub const fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Returns the HTTP status code carried by this error, looking through
    /// a [`Error::RetryExhausted`] wrapper.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RetryExhausted { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// Returns the buffered upstream body carried by this error, looking
    /// through a [`Error::RetryExhausted`] wrapper.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Status { body, .. } => Some(body),
            Self::RetryExhausted { source, .. } => source.body(),
            _ => None,
        }
    }

    /// Returns `true` if another attempt may succeed: transport-level
    /// failures, and status validation failures with a code >= 500.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Tls(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "connection error: failed to connect");

        let err = Error::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        let err = Error::unknown_service("billing");
        assert_eq!(err.to_string(), "unknown service: billing");

        let err = Error::json_deserialization("user.address.city", "missing field `city`");
        assert_eq!(
            err.to_string(),
            "JSON deserialization error at 'user.address.city': missing field `city`"
        );
    }

    #[test]
    fn status_display_includes_body() {
        let err = Error::status(
            503,
            "https://api.example.com/users",
            Bytes::from_static(b"busy"),
        );
        assert_eq!(
            err.to_string(),
            "unexpected status 503 for https://api.example.com/users: busy"
        );
    }

    #[test]
    fn status_display_truncates_long_bodies() {
        let body = Bytes::from("x".repeat(2048));
        let err = Error::status(500, "https://api.example.com", body);
        let rendered = err.to_string();
        assert!(rendered.ends_with("..."));
        assert!(rendered.len() < 700);
    }

    #[test]
    fn retry_exhausted_composes_chain() {
        let inner = Error::status(503, "https://api.example.com", Bytes::from_static(b"busy"));
        let err = Error::retry_exhausted(3, inner);
        assert_eq!(
            err.to_string(),
            "retry failed after 3 attempts: unexpected status 503 for https://api.example.com: busy"
        );
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(err.body().map(Bytes::as_ref), Some(&b"busy"[..]));
    }

    #[test]
    fn retryable_classification() {
        assert!(Error::connection("refused").is_retryable());
        assert!(Error::Timeout.is_retryable());
        assert!(Error::tls("handshake").is_retryable());
        assert!(Error::status(500, "u", Bytes::new()).is_retryable());
        assert!(Error::status(503, "u", Bytes::new()).is_retryable());
        assert!(!Error::status(404, "u", Bytes::new()).is_retryable());
        assert!(!Error::status(202, "u", Bytes::new()).is_retryable());
        assert!(!Error::NonRetryableBody.is_retryable());
        assert!(!Error::config("bad").is_retryable());
    }

    #[test]
    fn status_code_accessor() {
        assert_eq!(Error::status(404, "u", Bytes::new()).status_code(), Some(404));
        assert_eq!(Error::Timeout.status_code(), None);
    }
}
