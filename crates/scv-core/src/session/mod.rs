//! Session controller: credential submission, token lifecycle and the
//! login/register/workspace view state.
//!
//! Chains run strictly in order and stop at the first failure:
//! register → login → fetch profile → list snippets. Every step that
//! changes state first checks that the session epoch it started under is
//! still current, so a response arriving after logout is dropped.

use std::sync::Arc;

use anyhow::Result;

use crate::api::{Backend, Credentials, Language, UserProfile};
use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::error::VaultError;
use crate::notice::Notices;
use crate::store::{TokenStore, mask_token};
use crate::workspace::SnippetWorkspace;

mod busy;
mod state;

pub use busy::{BusyFlag, BusyGuard};
pub use state::{Epoch, SessionHandle, ViewMode};

/// Settings the controller needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// API base URL, shown when the health probe fails
    pub api_base: String,
    /// Front-end origin used for share links
    pub origin: String,
    pub default_language: Language,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            api_base: config.effective_api_base()?,
            origin: config.effective_origin()?,
            default_language: config.default_language,
        })
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            api_base: Config::DEFAULT_API_BASE.to_string(),
            origin: Config::DEFAULT_ORIGIN.to_string(),
            default_language: Language::default(),
        }
    }
}

pub struct SessionController<B, S, C> {
    backend: Arc<B>,
    session: SessionHandle<S>,
    workspace: SnippetWorkspace<B, S, C>,
    loading: BusyFlag,
    notices: Notices,
    api_base: String,
}

impl<B, S, C> SessionController<B, S, C>
where
    B: Backend,
    S: TokenStore,
    C: Clipboard,
{
    pub fn new(backend: Arc<B>, store: Arc<S>, clipboard: Arc<C>, options: SessionOptions) -> Self {
        let session = SessionHandle::new(store);
        let notices = Notices::new();
        let workspace = SnippetWorkspace::new(
            Arc::clone(&backend),
            session.clone(),
            clipboard,
            notices.clone(),
            options.origin,
            options.default_language,
        );
        Self {
            backend,
            session,
            workspace,
            loading: BusyFlag::new(),
            notices,
            api_base: options.api_base,
        }
    }

    pub fn workspace(&self) -> &SnippetWorkspace<B, S, C> {
        &self.workspace
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn view(&self) -> ViewMode {
        self.session.view()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.user().is_some()
    }

    /// True while a login or registration is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.is_busy()
    }

    /// Switches between the login and register tabs.
    pub fn select_tab(&self, tab: ViewMode) {
        self.session.select_tab(tab);
    }

    /// Startup sequence: optional health probe, then session restore.
    pub async fn mount(&self, probe_health: bool) -> bool {
        if probe_health {
            self.check_api_health().await;
        }
        self.restore().await
    }

    /// One-shot liveness probe. A failure raises a warning and nothing else.
    pub async fn check_api_health(&self) -> bool {
        match self.backend.health().await {
            Ok(body) => {
                tracing::debug!(status = body.trim(), "api health check passed");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "api is not reachable");
                self.notices.warn(format!(
                    "Cannot connect to the backend API. Make sure the backend is running on {}",
                    self.api_base
                ));
                false
            }
        }
    }

    /// Resumes the session from a stored token, if any.
    ///
    /// A token the server no longer accepts is cleared without a notice.
    pub async fn restore(&self) -> bool {
        let token = match self.session.token() {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stored token");
                self.notices.warn(err.to_string());
                return false;
            }
        };

        match self.fetch_user_profile(&token).await {
            Ok(_) => true,
            Err(err) => {
                tracing::info!(error = %err, "stored session could not be restored");
                false
            }
        }
    }

    /// Validates the credentials, logs in, stores the token and loads the
    /// profile. Session state is untouched on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), VaultError> {
        let _loading = self.loading.hold();
        let epoch = self.session.epoch();
        let result = match Credentials::new(email, password) {
            Ok(credentials) => self.login_chain(&credentials, epoch).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    /// Registers the account, then logs in with the same credentials.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), VaultError> {
        let _loading = self.loading.hold();
        let epoch = self.session.epoch();
        let result = match Credentials::new(email, password) {
            Ok(credentials) => self.register_chain(&credentials, epoch).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    async fn register_chain(&self, credentials: &Credentials, epoch: Epoch) -> Result<(), VaultError> {
        self.backend
            .register(credentials)
            .await
            .map_err(|err| VaultError::api("Registration failed", err))?;
        self.session.ensure_current(epoch)?;
        tracing::info!(email = credentials.email(), "account registered");

        self.login_chain(credentials, epoch).await
    }

    async fn login_chain(&self, credentials: &Credentials, epoch: Epoch) -> Result<(), VaultError> {
        let issued = self
            .backend
            .login(credentials)
            .await
            .map_err(|err| VaultError::api("Login failed", err))?;
        self.session.store_token(epoch, &issued.access_token)?;
        tracing::info!(
            email = credentials.email(),
            token = %mask_token(&issued.access_token),
            "logged in"
        );

        self.profile_chain(&issued.access_token, epoch).await?;
        Ok(())
    }

    /// Loads the profile for `token`. On success the workspace view opens and
    /// the snippet list is refreshed; on failure the stored token is cleared.
    pub async fn fetch_user_profile(&self, token: &str) -> Result<UserProfile, VaultError> {
        let epoch = self.session.epoch();
        self.profile_chain(token, epoch).await
    }

    async fn profile_chain(&self, token: &str, epoch: Epoch) -> Result<UserProfile, VaultError> {
        match self.backend.current_user(token).await {
            Ok(user) => {
                self.session.establish(epoch, user.clone())?;
                // The list refresh logs its own failures.
                let _ = self.workspace.list_snippets().await;
                Ok(user)
            }
            Err(err) => {
                self.session.ensure_current(epoch)?;
                tracing::warn!(error = %err, "profile fetch failed, dropping token");
                self.teardown()?;
                Err(VaultError::api("Failed to load your profile", err))
            }
        }
    }

    /// Ends the session locally: token, profile, snippet list and draft are
    /// cleared and the login tab is shown. No request is made.
    pub fn logout(&self) -> Result<(), VaultError> {
        let result = self.teardown();
        tracing::info!("logged out");
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    fn teardown(&self) -> Result<(), VaultError> {
        let result = self.session.expire();
        self.workspace.reset();
        result
    }

    fn report(&self, err: &VaultError) {
        if !matches!(err, VaultError::Superseded) {
            self.notices.error(err.to_string());
        }
    }
}
