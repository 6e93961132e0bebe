//! Client-side session and snippet-sharing workflow for SecureCode Vault.
//!
//! [`SessionController`] owns authentication and the view mode;
//! its [`SnippetWorkspace`] lists, creates and shares snippets with the
//! session's token. Both report through a shared [`Notices`] queue.

pub mod api;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod logging;
pub mod notice;
pub mod session;
pub mod store;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use api::{ApiError, Backend, HttpBackend, Language};
pub use clipboard::{Clipboard, SystemClipboard};
pub use config::Config;
pub use error::{ValidationError, VaultError};
pub use notice::{Notice, NoticeLevel, Notices};
pub use session::{SessionController, SessionOptions, ViewMode};
pub use store::{FileTokenStore, TokenStore};
pub use workspace::{ShareLink, SnippetWorkspace};
