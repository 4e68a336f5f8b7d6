//! Error types for the mapping API client.
//!
//! # Design
//! `MapiError` is the error a sent request settles to. It carries the
//! request it belongs to and one of two kinds: `Http` for anything that went
//! wrong on the wire (non-2xx status, or a transport failure with no status)
//! and `RequestAborted` for local cancellation.
//!
//! `Error` wraps `MapiError` together with the failures that happen before a
//! request ever reaches the transport: misuse of a spent request, input the
//! type system cannot rule out, and body serialization.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::request::RequestInfo;

pub type Result<T> = std::result::Result<T, Error>;

/// Tag distinguishing the two ways a sent request can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Non-2xx status or transport failure.
    Http,
    /// The request was aborted before it resolved.
    RequestAborted,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Http => "HttpError",
            ErrorKind::RequestAborted => "RequestAbortedError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error a sent request settles to.
#[derive(Debug, Clone)]
pub struct MapiError {
    /// The request that failed.
    pub request: RequestInfo,
    pub kind: ErrorKind,
    /// HTTP status, absent for aborts and transport failures.
    pub status_code: Option<u16>,
    /// Parsed JSON body of the error response, if any.
    pub body: Option<Value>,
    /// Human-readable message, taken from the body's `message` field when the
    /// API provides one.
    pub message: Option<String>,
}

impl MapiError {
    pub(crate) fn http(request: RequestInfo, status_code: u16, raw_body: &[u8]) -> Self {
        let body = if raw_body.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(
                serde_json::from_slice::<Value>(raw_body)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw_body).into_owned())),
            )
        };
        let message = body.as_ref().and_then(|b| match b {
            Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_string),
            Value::String(text) => Some(text.clone()),
            _ => None,
        });
        Self {
            request,
            kind: ErrorKind::Http,
            status_code: Some(status_code),
            body,
            message,
        }
    }

    pub(crate) fn undecodable(request: RequestInfo, status_code: u16, reason: String) -> Self {
        Self {
            request,
            kind: ErrorKind::Http,
            status_code: Some(status_code),
            body: None,
            message: Some(format!("response body could not be decoded: {reason}")),
        }
    }

    pub(crate) fn transport(request: RequestInfo, message: impl Into<String>) -> Self {
        Self {
            request,
            kind: ErrorKind::Http,
            status_code: None,
            body: None,
            message: Some(message.into()),
        }
    }

    pub(crate) fn aborted(request: RequestInfo) -> Self {
        Self {
            request,
            kind: ErrorKind::RequestAborted,
            status_code: None,
            body: None,
            message: Some("the request was aborted".to_string()),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ErrorKind::RequestAborted
    }
}

impl fmt::Display for MapiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.request.method, self.request.path)?;
        if let Some(status) = self.status_code {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MapiError {}

/// Failure reported by a `Transport` before any HTTP status was received.
#[derive(Debug, Clone, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(error: ureq::Error) -> Self {
        TransportError::new(error.to_string())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        TransportError::new(error.to_string())
    }
}

/// Errors returned by the client, its services and its requests.
#[derive(Debug, Error)]
pub enum Error {
    /// A sent request settled to an HTTP or abort error.
    #[error(transparent)]
    Mapi(#[from] MapiError),

    /// `send` or `each_page` was called on a request that was already sent.
    #[error("this request has already been sent; clone it to send it again")]
    AlreadySent,

    /// Input the API would reject and the types could not rule out.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The origin or an absolute path did not form a valid URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// The `MapiError` inside, if this error came from a sent request.
    pub fn as_mapi(&self) -> Option<&MapiError> {
        match self {
            Error::Mapi(err) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.as_mapi().map(|err| err.kind)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.as_mapi().and_then(|err| err.status_code)
    }
}
