//! Account and session command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use scv_core::{Config, ViewMode};

use super::{Controller, authenticated, controller, settle};

pub async fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let password = resolve_password(password)?;
    let controller = controller(config)?;

    let result = controller.login(email, &password).await;
    settle(controller.notices(), result)?;

    println!("Logged in as {}", signed_in_as(&controller, email));
    Ok(())
}

pub async fn register(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let password = resolve_password(password)?;
    let controller = controller(config)?;
    controller.select_tab(ViewMode::Register);

    let result = controller.register(email, &password).await;
    settle(controller.notices(), result)?;

    println!(
        "Registered and logged in as {}",
        signed_in_as(&controller, email)
    );
    Ok(())
}

/// Clears the stored session. Makes no request.
pub fn logout(config: &Config) -> Result<()> {
    let controller = controller(config)?;
    let result = controller.logout();
    settle(controller.notices(), result)?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(config: &Config) -> Result<()> {
    let controller = authenticated(config).await?;
    if let Some(user) = controller.user() {
        match user.id {
            Some(id) => println!("{}  (id {id})", user.email),
            None => println!("{}", user.email),
        }
    }
    Ok(())
}

fn signed_in_as(controller: &Controller, fallback: &str) -> String {
    controller
        .user()
        .map_or_else(|| fallback.to_string(), |user| user.email)
}

/// Uses the given password, or reads one line from stdin.
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush().context("flush prompt")?;
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
