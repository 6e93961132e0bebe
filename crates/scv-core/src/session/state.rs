use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::UserProfile;
use crate::error::VaultError;
use crate::store::TokenStore;

/// Which screen the front end shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Login,
    Register,
    /// Authenticated snippet workspace
    Workspace,
}

/// Session generation, captured when an operation starts.
///
/// Logout and token invalidation advance the epoch; a response that arrives
/// for an older epoch must not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

#[derive(Debug, Default)]
struct SessionState {
    user: Option<UserProfile>,
    view: ViewMode,
}

/// Session identity shared by the controller and the workspace: the token
/// store, the loaded profile, the view mode and the epoch.
pub struct SessionHandle<S> {
    store: Arc<S>,
    state: Arc<Mutex<SessionState>>,
    epoch: Arc<AtomicU64>,
}

impl<S> Clone for SessionHandle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
            epoch: Arc::clone(&self.epoch),
        }
    }
}

impl<S: TokenStore> SessionHandle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SessionState::default())),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn epoch(&self) -> Epoch {
        Epoch(self.epoch.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.epoch() == epoch
    }

    /// Fails with [`VaultError::Superseded`] if the session moved on since `epoch`.
    pub fn ensure_current(&self, epoch: Epoch) -> Result<(), VaultError> {
        if self.is_current(epoch) {
            Ok(())
        } else {
            tracing::debug!("discarding response for a superseded session");
            Err(VaultError::Superseded)
        }
    }

    pub fn token(&self) -> Result<Option<String>, VaultError> {
        self.store.get().map_err(VaultError::Store)
    }

    /// The stored token, or [`VaultError::NotAuthenticated`].
    pub fn require_token(&self) -> Result<String, VaultError> {
        self.token()?.ok_or(VaultError::NotAuthenticated)
    }

    /// Persists a freshly issued token, unless the session moved on.
    pub fn store_token(&self, epoch: Epoch, token: &str) -> Result<(), VaultError> {
        self.ensure_current(epoch)?;
        self.store.set(token).map_err(VaultError::Store)
    }

    /// Records the validated profile and enters the workspace view.
    pub fn establish(&self, epoch: Epoch, user: UserProfile) -> Result<(), VaultError> {
        self.ensure_current(epoch)?;
        let mut state = self.state();
        state.user = Some(user);
        state.view = ViewMode::Workspace;
        Ok(())
    }

    /// Drops the session: advances the epoch, clears the stored token and the
    /// profile, and returns to the login view. In-memory state is cleared even
    /// if the store fails.
    pub fn expire(&self) -> Result<(), VaultError> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.state();
            state.user = None;
            state.view = ViewMode::Login;
        }
        let had_token = self.store.clear().map_err(VaultError::Store)?;
        tracing::debug!(had_token, "session cleared");
        Ok(())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state().user.clone()
    }

    pub fn view(&self) -> ViewMode {
        self.state().view
    }

    /// Switches between the login and register tabs. Ignored while
    /// authenticated; the workspace is only entered through [`Self::establish`].
    pub fn select_tab(&self, tab: ViewMode) {
        let mut state = self.state();
        if state.view == ViewMode::Workspace || tab == ViewMode::Workspace {
            return;
        }
        state.view = tab;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;
    use crate::store::MemoryTokenStore;

    fn profile() -> UserProfile {
        UserProfile {
            email: "dev@example.test".to_string(),
            id: Some(1),
            created_at: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_tab_selection_only_between_auth_tabs() {
        let session = SessionHandle::new(Arc::new(MemoryTokenStore::new()));
        assert_eq!(session.view(), ViewMode::Login);

        session.select_tab(ViewMode::Register);
        assert_eq!(session.view(), ViewMode::Register);

        session.select_tab(ViewMode::Workspace);
        assert_eq!(session.view(), ViewMode::Register);

        session.select_tab(ViewMode::Login);
        assert_eq!(session.view(), ViewMode::Login);
    }

    #[test]
    fn test_establish_enters_workspace_and_locks_tabs() {
        let session = SessionHandle::new(Arc::new(MemoryTokenStore::new()));
        session.establish(session.epoch(), profile()).unwrap();

        assert_eq!(session.view(), ViewMode::Workspace);
        session.select_tab(ViewMode::Register);
        assert_eq!(session.view(), ViewMode::Workspace);
    }

    #[test]
    fn test_expire_bumps_epoch_and_rejects_stale_writes() {
        let store = Arc::new(MemoryTokenStore::with_token("old"));
        let session = SessionHandle::new(Arc::clone(&store));
        let before = session.epoch();

        session.expire().unwrap();

        assert!(!session.is_current(before));
        assert_eq!(store.get().unwrap(), None);
        assert!(matches!(
            session.store_token(before, "late"),
            Err(VaultError::Superseded)
        ));
        assert!(matches!(
            session.establish(before, profile()),
            Err(VaultError::Superseded)
        ));
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(session.user(), None);
    }

    #[test]
    fn test_require_token() {
        let session = SessionHandle::new(Arc::new(MemoryTokenStore::new()));
        assert!(matches!(
            session.require_token(),
            Err(VaultError::NotAuthenticated)
        ));
        session.store_token(session.epoch(), "tok").unwrap();
        assert_eq!(session.require_token().unwrap(), "tok");
    }
}
