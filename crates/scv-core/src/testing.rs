//! In-memory backend for controller and workspace tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Map;
use tokio::sync::Notify;

use crate::api::{
    AccessToken, ApiError, Backend, Credentials, DraftSnippet, ShareGrant, ShareRequest,
    SharedSnippet, Snippet, UserProfile,
};

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, String>,
    snippets: Vec<Snippet>,
    next_id: i64,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, ApiError>,
    share_requests: Vec<ShareRequest>,
    gates: HashMap<&'static str, Arc<Notify>>,
}

/// Backend that keeps accounts and snippets in memory.
///
/// Tokens are `token-<email>`. Any call can be made to fail, and any call can
/// be held until the test releases its gate.
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_account(email: &str, password: &str) -> Self {
        let backend = Self::new();
        backend
            .state()
            .accounts
            .insert(email.to_string(), password.to_string());
        backend
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn token_for(email: &str) -> String {
        format!("token-{email}")
    }

    /// Every later `op` call fails with `err`.
    pub(crate) fn fail(&self, op: &'static str, err: ApiError) {
        self.state().failures.insert(op, err);
    }

    pub(crate) fn recover(&self, op: &'static str) {
        self.state().failures.remove(op);
    }

    /// Holds the next `op` call until the returned handle is notified.
    pub(crate) fn gate(&self, op: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state().gates.insert(op, Arc::clone(&notify));
        notify
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    pub(crate) fn call_log(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub(crate) fn add_snippet(&self, title: &str) -> i64 {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.snippets.push(snippet(id, title, "python", "print(1)"));
        id
    }

    pub(crate) fn share_requests(&self) -> Vec<ShareRequest> {
        self.state().share_requests.clone()
    }

    async fn enter(&self, op: &'static str) -> Result<(), ApiError> {
        let gate = {
            let mut state = self.state();
            state.calls.push(op);
            state.gates.remove(op)
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.state().failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn authorize(&self, token: &str) -> Result<String, ApiError> {
        let email = token.strip_prefix("token-").unwrap_or_default();
        if self.state().accounts.contains_key(email) {
            Ok(email.to_string())
        } else {
            Err(ApiError::http_status(
                401,
                r#"{"detail":"Could not validate credentials"}"#,
            ))
        }
    }
}

pub(crate) fn snippet(id: i64, title: &str, language: &str, code: &str) -> Snippet {
    Snippet {
        id,
        title: title.to_string(),
        language: language.to_string(),
        code: code.to_string(),
        created_at: "2024-03-01T10:00:00".to_string(),
        user_id: Some(1),
        updated_at: None,
        extra: Map::new(),
    }
}

impl Backend for FakeBackend {
    async fn health(&self) -> Result<String, ApiError> {
        self.enter("health").await?;
        Ok("OK".to_string())
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.enter("register").await?;
        let body = serde_json::to_value(credentials).unwrap_or_default();
        let email = body["email"].as_str().unwrap_or_default().to_string();
        let password = body["password"].as_str().unwrap_or_default().to_string();
        let mut state = self.state();
        if state.accounts.contains_key(&email) {
            return Err(ApiError::http_status(
                400,
                r#"{"detail":"Email already registered"}"#,
            ));
        }
        state.accounts.insert(email, password);
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<AccessToken, ApiError> {
        self.enter("login").await?;
        let body = serde_json::to_value(credentials).unwrap_or_default();
        let email = body["email"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();
        if self.state().accounts.get(email).map(String::as_str) != Some(password) {
            return Err(ApiError::http_status(
                401,
                r#"{"detail":"Incorrect email or password"}"#,
            ));
        }
        Ok(AccessToken {
            access_token: Self::token_for(email),
            token_type: Some("bearer".to_string()),
        })
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.enter("current_user").await?;
        let email = self.authorize(token)?;
        Ok(UserProfile {
            email,
            id: Some(1),
            created_at: None,
            extra: Map::new(),
        })
    }

    async fn list_snippets(&self, token: &str) -> Result<Vec<Snippet>, ApiError> {
        self.enter("list_snippets").await?;
        self.authorize(token)?;
        Ok(self.state().snippets.clone())
    }

    async fn create_snippet(&self, token: &str, draft: &DraftSnippet) -> Result<Snippet, ApiError> {
        self.enter("create_snippet").await?;
        self.authorize(token)?;
        let mut state = self.state();
        state.next_id += 1;
        let created = snippet(
            state.next_id,
            &draft.title,
            draft.language.id(),
            &draft.code,
        );
        state.snippets.push(created.clone());
        Ok(created)
    }

    async fn get_snippet(&self, token: &str, id: i64) -> Result<Snippet, ApiError> {
        self.enter("get_snippet").await?;
        self.authorize(token)?;
        self.state()
            .snippets
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ApiError::http_status(404, r#"{"detail":"Snippet not found"}"#))
    }

    async fn delete_snippet(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.enter("delete_snippet").await?;
        self.authorize(token)?;
        let mut state = self.state();
        let before = state.snippets.len();
        state.snippets.retain(|s| s.id != id);
        if state.snippets.len() == before {
            return Err(ApiError::http_status(
                404,
                r#"{"detail":"Snippet not found"}"#,
            ));
        }
        Ok(())
    }

    async fn share_snippet(
        &self,
        token: &str,
        id: i64,
        request: &ShareRequest,
    ) -> Result<ShareGrant, ApiError> {
        self.enter("share_snippet").await?;
        self.authorize(token)?;
        let mut state = self.state();
        if !state.snippets.iter().any(|s| s.id == id) {
            return Err(ApiError::http_status(
                404,
                r#"{"detail":"Snippet not found"}"#,
            ));
        }
        state.share_requests.push(request.clone());
        Ok(ShareGrant {
            token: format!("share-{id}"),
            expires_at: Some("2024-03-02T10:00:00".to_string()),
            is_active: Some(true),
        })
    }

    async fn shared_snippet(
        &self,
        share_token: &str,
        password: Option<&str>,
    ) -> Result<SharedSnippet, ApiError> {
        self.enter("shared_snippet").await?;
        let id: i64 = share_token
            .strip_prefix("share-")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| {
                ApiError::http_status(404, r#"{"detail":"Share link not found or expired"}"#)
            })?;
        let state = self.state();
        let protected = state
            .share_requests
            .iter()
            .rev()
            .find_map(|r| r.password.clone());
        if protected.is_some() && protected.as_deref() != password {
            return Err(ApiError::http_status(
                401,
                r#"{"detail":"Invalid password"}"#,
            ));
        }
        let found = state
            .snippets
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::http_status(404, r#"{"detail":"Snippet not found"}"#))?;
        Ok(SharedSnippet {
            title: found.title.clone(),
            language: found.language.clone(),
            code: found.code.clone(),
            shared_at: "2024-03-01T11:00:00".to_string(),
        })
    }
}
