//! Durable storage for the session's bearer token.
//!
//! The token is persisted under a single fixed key in `<base>/auth.json`
//! with restricted permissions (0600). Tokens are never logged or displayed
//! in full.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Storage for the bearer token that survives restarts.
///
/// `get` is called at startup and before every authenticated request; `set`
/// only after a successful login; `clear` on logout or when the server
/// rejects the token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, token: &str) -> Result<()>;
    /// Removes the token. Returns whether one was present.
    fn clear(&self) -> Result<bool>;
}

/// On-disk layout of `auth.json`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct AuthFile {
    #[serde(flatten)]
    entries: HashMap<String, String>,
}

/// Token store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location (`$SCV_HOME/auth.json`).
    pub fn default_location() -> Self {
        Self::new(paths::auth_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file. Returns an empty map if the file doesn't exist.
    fn load(&self) -> Result<AuthFile> {
        if !self.path.exists() {
            return Ok(AuthFile::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token store {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token store {}", self.path.display()))
    }

    /// Saves the file with restricted permissions (0600).
    fn save(&self, file: &AuthFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(file).context("Failed to serialize token store")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut out = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            out.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.load()?.entries.remove(TOKEN_KEY))
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut file = self.load()?;
        file.entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save(&file)
    }

    fn clear(&self) -> Result<bool> {
        let mut file = self.load()?;
        let had_token = file.entries.remove(TOKEN_KEY).is_some();
        if had_token {
            self.save(&file)?;
        }
        Ok(had_token)
    }
}

/// In-memory token store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some())
    }
}

/// Masks a token for display (shows first 8 and last 4 chars).
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
