//! SecureCode Vault API client.
//!
//! [`Backend`] is the seam the session controller and snippet workspace talk
//! through. [`HttpBackend`] is the real implementation; tests supply their own.

use std::future::Future;

mod client;
mod errors;
mod types;

pub use client::HttpBackend;
pub use errors::{ApiError, ApiErrorKind};
pub use types::{
    AccessToken, Credentials, DraftSnippet, Language, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN,
    SHARE_EXPIRES_HOURS, ShareAccess, ShareGrant, ShareRequest, SharedSnippet, Snippet,
    UnknownLanguage, UserProfile,
};

/// Calls exposed by the API. Authenticated calls take the bearer token.
pub trait Backend: Send + Sync {
    /// `GET /health`. Any 2xx counts as healthy; the body text is returned as is.
    fn health(&self) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// `POST /auth/register`
    fn register(&self, credentials: &Credentials)
    -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /auth/login`
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AccessToken, ApiError>> + Send;

    /// `GET /users/me`
    fn current_user(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserProfile, ApiError>> + Send;

    /// `GET /snippets`
    fn list_snippets(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Snippet>, ApiError>> + Send;

    /// `POST /snippets`
    fn create_snippet(
        &self,
        token: &str,
        draft: &DraftSnippet,
    ) -> impl Future<Output = Result<Snippet, ApiError>> + Send;

    /// `GET /snippets/{id}`
    fn get_snippet(
        &self,
        token: &str,
        id: i64,
    ) -> impl Future<Output = Result<Snippet, ApiError>> + Send;

    /// `DELETE /snippets/{id}`
    fn delete_snippet(
        &self,
        token: &str,
        id: i64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /snippets/{id}/share`
    fn share_snippet(
        &self,
        token: &str,
        id: i64,
        request: &ShareRequest,
    ) -> impl Future<Output = Result<ShareGrant, ApiError>> + Send;

    /// `GET /shared/{token}` (anonymous)
    fn shared_snippet(
        &self,
        share_token: &str,
        password: Option<&str>,
    ) -> impl Future<Output = Result<SharedSnippet, ApiError>> + Send;
}
