//! CLI command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use scv_core::store::FileTokenStore;
use scv_core::{
    Config, HttpBackend, NoticeLevel, Notices, SessionController, SessionOptions,
    SystemClipboard, VaultError,
};

use super::Reported;

pub mod auth;
pub mod config;
pub mod health;
pub mod snippets;

pub(crate) type Controller = SessionController<HttpBackend, FileTokenStore, SystemClipboard>;

/// Builds a controller over the real API, token file and clipboard.
pub(crate) fn controller(config: &Config) -> Result<Controller> {
    let backend = HttpBackend::from_config(config).context("create API client")?;
    let options = SessionOptions::from_config(config)?;
    Ok(SessionController::new(
        Arc::new(backend),
        Arc::new(FileTokenStore::default_location()),
        Arc::new(SystemClipboard),
        options,
    ))
}

/// Mounts the controller and requires a restored session.
pub(crate) async fn authenticated(config: &Config) -> Result<Controller> {
    let controller = controller(config)?;
    let restored = controller.mount(config.probe_health).await;
    let result = if restored {
        Ok(())
    } else {
        Err(VaultError::NotAuthenticated)
    };
    settle(controller.notices(), result)?;
    Ok(controller)
}

/// Prints pending notices, then converts an operation result.
///
/// Info goes to stdout; warnings and errors to stderr. A failure that did
/// not raise its own notice is printed here.
pub(crate) fn settle<T>(notices: &Notices, result: Result<T, VaultError>) -> Result<T> {
    let mut printed_error = false;
    for notice in notices.drain() {
        match notice.level {
            NoticeLevel::Info => println!("{notice}"),
            NoticeLevel::Warning => eprintln!("warning: {notice}"),
            NoticeLevel::Error => {
                printed_error = true;
                eprintln!("{notice}");
            }
        }
    }

    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if !printed_error {
                eprintln!("{err}");
            }
            Err(Reported.into())
        }
    }
}
