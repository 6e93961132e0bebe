//! Snippet workspace: the authenticated user's snippet list, the draft form,
//! and the list/create/share calls made with the session's token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{
    ApiError, Backend, DraftSnippet, Language, ShareRequest, SharedSnippet, Snippet,
};
use crate::clipboard::Clipboard;
use crate::error::VaultError;
use crate::notice::Notices;
use crate::session::{BusyFlag, Epoch, SessionHandle};
use crate::store::TokenStore;

const FETCH_FAILED: &str = "Failed to fetch snippets";

/// Absolute link granting anonymous access to one snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub url: String,
    /// Server-reported expiry, if any
    pub expires_at: Option<String>,
}

/// Builds `<origin>/shared/<token>`.
pub fn share_url(origin: &str, token: &str) -> String {
    format!("{}/shared/{}", origin.trim_end_matches('/'), token)
}

#[derive(Debug, Default)]
struct WorkspaceState {
    draft: DraftSnippet,
    snippets: Vec<Snippet>,
    /// Why the most recent list refresh failed, if it did
    refresh_error: Option<ApiError>,
}

pub struct SnippetWorkspace<B, S, C> {
    backend: Arc<B>,
    session: SessionHandle<S>,
    clipboard: Arc<C>,
    notices: Notices,
    origin: String,
    default_language: Language,
    state: Mutex<WorkspaceState>,
    busy: BusyFlag,
}

impl<B, S, C> SnippetWorkspace<B, S, C>
where
    B: Backend,
    S: TokenStore,
    C: Clipboard,
{
    pub(crate) fn new(
        backend: Arc<B>,
        session: SessionHandle<S>,
        clipboard: Arc<C>,
        notices: Notices,
        origin: String,
        default_language: Language,
    ) -> Self {
        let state = WorkspaceState {
            draft: DraftSnippet::with_language(default_language),
            snippets: Vec::new(),
            refresh_error: None,
        };
        Self {
            backend,
            session,
            clipboard,
            notices,
            origin,
            default_language,
            state: Mutex::new(state),
            busy: BusyFlag::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorkspaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current snapshot of the snippet list.
    pub fn snippets(&self) -> Vec<Snippet> {
        self.state().snippets.clone()
    }

    pub fn draft(&self) -> DraftSnippet {
        self.state().draft.clone()
    }

    pub fn set_draft(&self, draft: DraftSnippet) {
        self.state().draft = draft;
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state().draft.title = title.into();
    }

    pub fn set_language(&self, language: Language) {
        self.state().draft.language = language;
    }

    pub fn set_code(&self, code: impl Into<String>) {
        self.state().draft.code = code.into();
    }

    /// True while a create or delete is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Outcome of the most recent list refresh, including the one that runs
    /// when a session is established.
    pub fn last_refresh(&self) -> Result<(), VaultError> {
        match &self.state().refresh_error {
            Some(err) => Err(VaultError::api(FETCH_FAILED, err.clone())),
            None => Ok(()),
        }
    }

    /// Forgets the list and resets the draft.
    pub(crate) fn reset(&self) {
        let mut state = self.state();
        state.snippets.clear();
        state.refresh_error = None;
        state.draft = DraftSnippet::with_language(self.default_language);
    }

    /// Replaces the list with the server's current collection.
    ///
    /// Failures are logged and leave the list untouched; no notice is raised.
    pub async fn list_snippets(&self) -> Result<(), VaultError> {
        let epoch = self.session.epoch();
        let token = self.session.require_token()?;

        match self.backend.list_snippets(&token).await {
            Ok(snippets) => {
                self.session.ensure_current(epoch)?;
                tracing::debug!(count = snippets.len(), "snippet list refreshed");
                let mut state = self.state();
                state.snippets = snippets;
                state.refresh_error = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch snippets");
                let failure = self.api_failure(epoch, FETCH_FAILED, err.clone());
                if !matches!(failure, VaultError::Superseded) {
                    self.state().refresh_error = Some(err);
                }
                Err(failure)
            }
        }
    }

    /// Submits the draft, then resets it and refreshes the list.
    pub async fn create_snippet(&self) -> Result<Snippet, VaultError> {
        let _busy = self.busy.hold();
        let result = self.create_inner().await;
        match &result {
            Ok(_) => self.notices.info("Snippet created successfully!"),
            Err(err) => self.report(err),
        }
        result
    }

    async fn create_inner(&self) -> Result<Snippet, VaultError> {
        let draft = self.draft();
        draft.validate()?;

        let epoch = self.session.epoch();
        let token = self.session.require_token()?;
        let created = self
            .backend
            .create_snippet(&token, &draft)
            .await
            .map_err(|err| self.api_failure(epoch, "Failed to create snippet", err))?;
        self.session.ensure_current(epoch)?;
        tracing::info!(id = created.id, "snippet created");

        self.state().draft = DraftSnippet::with_language(self.default_language);
        // A failed refresh is logged and leaves the old list in place.
        let _ = self.list_snippets().await;
        Ok(created)
    }

    /// Requests a 24-hour share token and copies the resulting link to the
    /// clipboard. An optional password protects the link.
    pub async fn share_snippet(
        &self,
        id: i64,
        password: Option<&str>,
    ) -> Result<ShareLink, VaultError> {
        let result = self.share_inner(id, password).await;
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    async fn share_inner(&self, id: i64, password: Option<&str>) -> Result<ShareLink, VaultError> {
        let epoch = self.session.epoch();
        let token = self.session.require_token()?;
        let request = ShareRequest::new(password.map(str::to_string));
        let grant = self
            .backend
            .share_snippet(&token, id, &request)
            .await
            .map_err(|err| self.api_failure(epoch, "Failed to share snippet", err))?;
        self.session.ensure_current(epoch)?;

        let link = ShareLink {
            url: share_url(&self.origin, &grant.token),
            expires_at: grant.expires_at,
        };
        match self.clipboard.copy(&link.url) {
            Ok(()) => self.notices.info("Share link copied to clipboard!"),
            Err(err) => {
                tracing::warn!(error = %err, "clipboard copy failed");
                self.notices.warn(format!(
                    "Could not copy to clipboard ({err}). Share link: {}",
                    link.url
                ));
            }
        }
        Ok(link)
    }

    /// Fetches one snippet by id.
    pub async fn get_snippet(&self, id: i64) -> Result<Snippet, VaultError> {
        let result = self.get_inner(id).await;
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    async fn get_inner(&self, id: i64) -> Result<Snippet, VaultError> {
        let epoch = self.session.epoch();
        let token = self.session.require_token()?;
        let snippet = self
            .backend
            .get_snippet(&token, id)
            .await
            .map_err(|err| self.api_failure(epoch, "Failed to load snippet", err))?;
        self.session.ensure_current(epoch)?;
        Ok(snippet)
    }

    /// Deletes a snippet, then refreshes the list.
    pub async fn delete_snippet(&self, id: i64) -> Result<(), VaultError> {
        let _busy = self.busy.hold();
        let result = self.delete_inner(id).await;
        match &result {
            Ok(()) => self.notices.info("Snippet deleted successfully"),
            Err(err) => self.report(err),
        }
        result
    }

    async fn delete_inner(&self, id: i64) -> Result<(), VaultError> {
        let epoch = self.session.epoch();
        let token = self.session.require_token()?;
        self.backend
            .delete_snippet(&token, id)
            .await
            .map_err(|err| self.api_failure(epoch, "Failed to delete snippet", err))?;
        self.session.ensure_current(epoch)?;
        tracing::info!(id, "snippet deleted");
        // The list refresh logs its own failures.
        let _ = self.list_snippets().await;
        Ok(())
    }

    /// Opens a snippet through its share token. Needs no session.
    pub async fn open_shared(
        &self,
        share_token: &str,
        password: Option<&str>,
    ) -> Result<SharedSnippet, VaultError> {
        let result = self
            .backend
            .shared_snippet(share_token, password)
            .await
            .map_err(|err| VaultError::api("Failed to open shared snippet", err));
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    /// Maps an API failure, discarding it if the session moved on and
    /// expiring the session when the server rejected the token.
    fn api_failure(&self, epoch: Epoch, action: &'static str, err: ApiError) -> VaultError {
        if !self.session.is_current(epoch) {
            return VaultError::Superseded;
        }
        if err.is_unauthorized() {
            tracing::warn!("token rejected, ending session");
            if let Err(store_err) = self.session.expire() {
                tracing::warn!(error = %store_err, "failed to clear token");
            }
            self.reset();
            self.notices
                .warn("Your session has expired. Please log in again.");
        }
        VaultError::api(action, err)
    }

    fn report(&self, err: &VaultError) {
        if !matches!(err, VaultError::Superseded) {
            self.notices.error(err.to_string());
        }
    }
}
