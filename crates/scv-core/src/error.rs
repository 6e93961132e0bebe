//! Error types surfaced by session and workspace operations.

use std::fmt;

use crate::api::{ApiError, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};

/// Input rejected locally, before any request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyEmail,
    EmptyPassword,
    PasswordTooShort,
    PasswordTooLong,
    /// Snippet title or code is blank
    IncompleteSnippet,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyEmail => write!(f, "Please enter your email"),
            ValidationError::EmptyPassword => write!(f, "Please enter your password"),
            ValidationError::PasswordTooShort => write!(
                f,
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            ),
            ValidationError::PasswordTooLong => write!(
                f,
                "Password must be less than {MAX_PASSWORD_LEN} characters"
            ),
            ValidationError::IncompleteSnippet => write!(f, "Please fill in title and code"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure of a session or workspace operation.
#[derive(Debug)]
pub enum VaultError {
    /// Input rejected before any request
    Validation(ValidationError),
    /// The API call failed; `action` names the operation ("Login failed")
    Api {
        action: &'static str,
        source: ApiError,
    },
    /// An authenticated operation ran without a stored token
    NotAuthenticated,
    /// Reading or writing the token store failed
    Store(anyhow::Error),
    /// The session changed (logout, expiry) while the request was in flight;
    /// the response was discarded
    Superseded,
}

impl VaultError {
    pub(crate) fn api(action: &'static str, source: ApiError) -> Self {
        VaultError::Api { action, source }
    }

    /// The underlying API error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            VaultError::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::Validation(err) => write!(f, "{err}"),
            VaultError::Api { action, source } => write!(f, "{action}: {source}"),
            VaultError::NotAuthenticated => {
                write!(f, "Not logged in. Run `scv login` first.")
            }
            VaultError::Store(err) => write!(f, "Session storage failed: {err:#}"),
            VaultError::Superseded => write!(f, "Session changed before the response arrived"),
        }
    }
}

impl std::error::Error for VaultError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VaultError::Validation(err) => Some(err),
            VaultError::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ValidationError> for VaultError {
    fn from(err: ValidationError) -> Self {
        VaultError::Validation(err)
    }
}
