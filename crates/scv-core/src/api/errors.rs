use std::fmt;

use serde_json::Value;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never produced a response (DNS, refused connection, TLS)
    Transport,
    /// Connection timeout or request timeout
    Timeout,
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Failed to parse a success response
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the API with kind and details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Server-provided `detail`, when the body carried one
    pub detail: Option<String>,
    /// Generic one-line description of the failure
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            detail: None,
            message: message.into(),
        }
    }

    /// Creates an HTTP status error, extracting `detail` from the body.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::HttpStatus,
            status: Some(status),
            detail: extract_detail(body),
            message: format!("Request failed with status code {status}"),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// The text shown to the user: the server detail when present, else the
    /// generic message.
    pub fn user_message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }

    /// True for a 401 response: the bearer token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// True when the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Transport | ApiErrorKind::Timeout)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::timeout(format!("Request timed out: {err}"))
        } else if err.is_decode() {
            ApiError::parse(format!("Failed to parse response: {err}"))
        } else {
            ApiError::transport(err.to_string())
        }
    }
}

/// Pulls a human-readable `detail` out of an error body.
///
/// `detail` is either a plain string or, for request validation errors, a
/// list of objects whose `msg` fields are joined.
fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}
