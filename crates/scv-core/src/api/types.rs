//! Wire types exchanged with the SecureCode Vault API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Minimum password length accepted by the login/registration forms.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Maximum password length accepted by the server.
pub const MAX_PASSWORD_LEN: usize = 100;
/// Validity window requested for every share link.
pub const SHARE_EXPIRES_HOURS: u32 = 24;

/// Snippet languages offered by the draft form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    Html,
    Css,
    Sql,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::Html,
        Language::Css,
        Language::Sql,
    ];

    /// Identifier sent to the server.
    pub fn id(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Html => "html",
            Language::Css => "css",
            Language::Sql => "sql",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Sql => "SQL",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unsupported language name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supported: Vec<&str> = Language::ALL.iter().map(|l| l.id()).collect();
        write!(
            f,
            "unsupported language '{}' (expected one of: {})",
            self.0,
            supported.join(", ")
        )
    }
}

impl std::error::Error for UnknownLanguage {}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        let alias = match needle.as_str() {
            "c++" => "cpp",
            "js" => "javascript",
            "ts" => "typescript",
            "py" => "python",
            other => other,
        };
        Language::ALL
            .into_iter()
            .find(|l| l.id() == alias)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Email/password pair that passed the form-level checks.
#[derive(Clone, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Validates the pair the way the login/registration form does.
    pub fn new(email: &str, password: &str) -> Result<Self, ValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        if password.trim().is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        let len = password.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        if len > MAX_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooLong);
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Successful `/auth/login` response.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// The authenticated user as returned by `/users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Fields the client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored snippet owned by the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub language: String,
    pub code: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Snippet {
    /// Creation date as `YYYY-MM-DD`, or the raw timestamp if it cannot be parsed.
    pub fn created_date(&self) -> String {
        format_date(&self.created_at)
    }
}

/// Body of `POST /snippets`, also the editable draft form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftSnippet {
    pub title: String,
    pub language: Language,
    pub code: String,
}

impl DraftSnippet {
    /// An empty draft with the given preselected language.
    pub fn with_language(language: Language) -> Self {
        Self {
            title: String::new(),
            language,
            code: String::new(),
        }
    }

    /// Title and code must both contain something other than whitespace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() || self.code.trim().is_empty() {
            return Err(ValidationError::IncompleteSnippet);
        }
        Ok(())
    }
}

impl Default for DraftSnippet {
    fn default() -> Self {
        Self::with_language(Language::default())
    }
}

/// Body of `POST /snippets/{id}/share`.
#[derive(Debug, Clone, Serialize)]
pub struct ShareRequest {
    pub expires_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ShareRequest {
    pub fn new(password: Option<String>) -> Self {
        Self {
            expires_hours: SHARE_EXPIRES_HOURS,
            password,
        }
    }
}

/// Share token issued by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShareGrant {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A snippet opened anonymously through a share link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedSnippet {
    pub title: String,
    pub language: String,
    pub code: String,
    pub shared_at: String,
}

/// Body of `GET /shared/{token}` for password-protected links.
#[derive(Debug, Clone, Serialize)]
pub struct ShareAccess {
    pub password: String,
}

fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}
