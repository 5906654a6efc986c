//! Error types for the webfinger library.
//!
//! A single error type covers every way a lookup can fail: bad input,
//! transport failures, non-success HTTP statuses and undecodable documents.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use thiserror::Error;

/// The unified error type for webfinger operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input validation errors (unparsable identifier, no derivable host).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Network transport errors (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a status outside 200-299.
    #[error("{0}")]
    Status(#[from] StatusError),

    /// The response body is not a valid JRD.
    #[error("invalid JRD: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// The identifier is neither an absolute URI nor an email-like address.
    #[error("malformed identifier '{value}': {reason}")]
    MalformedIdentifier { value: String, reason: String },

    /// No WebFinger host can be derived from the resource.
    #[error("cannot determine WebFinger host for '{resource}'")]
    NoHost { resource: String },
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The host actively refused the connection.
    #[error("connection refused: {message}")]
    Refused { message: String },

    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// TLS negotiation failed.
    #[error("TLS error: {message}")]
    Tls { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Any other HTTP client failure.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl TransportError {
    /// Whether a failed HTTPS attempt may be repeated over plain HTTP.
    ///
    /// Only refused connections and TLS negotiation failures qualify. Some
    /// hosting environments report an unreachable HTTPS port as an
    /// `ssl_certificate_error`, so that text is accepted too.
    pub fn permits_insecure_retry(&self) -> bool {
        match self {
            TransportError::Refused { .. } | TransportError::Tls { .. } => true,
            TransportError::Connection { message } => {
                message.to_lowercase().contains("ssl_certificate_error")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries caller-supplied text (host, resource, rels), so it
        // must not take part in classification.
        let err = err.without_url();
        let message = error_chain(&err);

        if err.is_timeout() {
            TransportError::Timeout { message }
        } else if err.is_connect() {
            if is_refused(&err) {
                TransportError::Refused { message }
            } else if looks_like_tls(&message) {
                TransportError::Tls { message }
            } else {
                TransportError::Connection { message }
            }
        } else {
            TransportError::Http { message }
        }
    }
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        source = cause.source();
    }
    false
}

fn looks_like_tls(message: &str) -> bool {
    let message = message.to_lowercase();
    ["tls", "ssl", "certificate", "handshake"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// A response whose status is outside the success range.
#[derive(Debug)]
pub struct StatusError {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase, when the status code has one.
    pub reason: Option<String>,
}

impl StatusError {
    /// Create a new status error.
    pub fn new(status: u16, reason: Option<String>) -> Self {
        Self { status, reason }
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(ref reason) = self.reason {
            write!(f, " {}", reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for StatusError {}
