//! Config command handlers.

use anyhow::{Context, Result};
use scv_core::config::{Config, paths};

/// Prints the config path; notes on stderr when the file is absent.
pub fn path() {
    let config_path = paths::config_path();
    println!("{}", config_path.display());
    if !config_path.exists() {
        eprintln!("(not created yet; defaults apply until `scv config init`)");
    }
}

pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}
