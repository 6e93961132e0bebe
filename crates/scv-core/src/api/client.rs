use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{
    AccessToken, ApiError, Backend, Credentials, DraftSnippet, ShareAccess, ShareGrant,
    ShareRequest, SharedSnippet, Snippet, UserProfile,
};
use crate::config::Config;

/// HTTP implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Creates a client for the given base URL.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Creates a client from the effective configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.effective_api_base()?;
        Self::new(&base_url, config.request_timeout())
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, path, authenticated = token.is_some(), "api request");
        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and returns the response if its status is 2xx.
    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "api request failed");
        Err(ApiError::http_status(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::parse(format!("Failed to parse response: {e}")))
    }
}

impl Backend for HttpBackend {
    async fn health(&self) -> Result<String, ApiError> {
        let response = Self::send(self.request(Method::GET, "/health", None)).await?;
        Ok(response.text().await.unwrap_or_default())
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let builder = self
            .request(Method::POST, "/auth/register", None)
            .json(credentials);
        Self::send(builder).await.map(drop)
    }

    async fn login(&self, credentials: &Credentials) -> Result<AccessToken, ApiError> {
        let builder = self
            .request(Method::POST, "/auth/login", None)
            .json(credentials);
        Self::send_json(builder).await
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        Self::send_json(self.request(Method::GET, "/users/me", Some(token))).await
    }

    async fn list_snippets(&self, token: &str) -> Result<Vec<Snippet>, ApiError> {
        Self::send_json(self.request(Method::GET, "/snippets", Some(token))).await
    }

    async fn create_snippet(&self, token: &str, draft: &DraftSnippet) -> Result<Snippet, ApiError> {
        let builder = self
            .request(Method::POST, "/snippets", Some(token))
            .json(draft);
        Self::send_json(builder).await
    }

    async fn get_snippet(&self, token: &str, id: i64) -> Result<Snippet, ApiError> {
        let path = format!("/snippets/{id}");
        Self::send_json(self.request(Method::GET, &path, Some(token))).await
    }

    async fn delete_snippet(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let path = format!("/snippets/{id}");
        Self::send(self.request(Method::DELETE, &path, Some(token)))
            .await
            .map(drop)
    }

    async fn share_snippet(
        &self,
        token: &str,
        id: i64,
        request: &ShareRequest,
    ) -> Result<ShareGrant, ApiError> {
        let path = format!("/snippets/{id}/share");
        let builder = self.request(Method::POST, &path, Some(token)).json(request);
        Self::send_json(builder).await
    }

    async fn shared_snippet(
        &self,
        share_token: &str,
        password: Option<&str>,
    ) -> Result<SharedSnippet, ApiError> {
        let path = format!("/shared/{share_token}");
        let mut builder = self.request(Method::GET, &path, None);
        if let Some(password) = password {
            builder = builder.json(&ShareAccess {
                password: password.to_string(),
            });
        }
        Self::send_json(builder).await
    }
}
