//! Snippet command handlers.

use anyhow::Result;
use scv_core::{Config, Language};

use super::{authenticated, controller, settle};

pub async fn list(config: &Config) -> Result<()> {
    // Restoring the session already loaded the list.
    let controller = authenticated(config).await?;
    let workspace = controller.workspace();
    settle(controller.notices(), workspace.last_refresh())?;

    let snippets = workspace.snippets();
    if snippets.is_empty() {
        println!("No snippets yet. Create one with `scv snippets create`.");
    } else {
        for snippet in snippets {
            println!(
                "{}  {}  {}  {}",
                snippet.id,
                snippet.title,
                snippet.language,
                snippet.created_date()
            );
        }
    }
    Ok(())
}

pub async fn create(
    config: &Config,
    title: &str,
    language: Option<Language>,
    code: &str,
) -> Result<()> {
    let controller = authenticated(config).await?;
    let workspace = controller.workspace();
    workspace.set_title(title);
    if let Some(language) = language {
        workspace.set_language(language);
    }
    workspace.set_code(code);

    let result = workspace.create_snippet().await;
    let created = settle(controller.notices(), result)?;
    println!("{}  {}", created.id, created.title);
    Ok(())
}

pub async fn show(config: &Config, id: i64) -> Result<()> {
    let controller = authenticated(config).await?;
    let result = controller.workspace().get_snippet(id).await;
    let snippet = settle(controller.notices(), result)?;

    println!(
        "{} ({}, {})",
        snippet.title,
        language_label(&snippet.language),
        snippet.created_date()
    );
    println!();
    println!("{}", snippet.code);
    Ok(())
}

pub async fn delete(config: &Config, id: i64) -> Result<()> {
    let controller = authenticated(config).await?;
    let result = controller.workspace().delete_snippet(id).await;
    settle(controller.notices(), result)
}

pub async fn share(config: &Config, id: i64, password: Option<&str>) -> Result<()> {
    let controller = authenticated(config).await?;
    let result = controller.workspace().share_snippet(id, password).await;
    let link = settle(controller.notices(), result)?;

    println!("{}", link.url);
    if let Some(expires_at) = link.expires_at {
        println!("Expires at {expires_at}");
    }
    Ok(())
}

/// Opens a share link. Needs no session.
pub async fn open_shared(config: &Config, token: &str, password: Option<&str>) -> Result<()> {
    let controller = controller(config)?;
    let result = controller.workspace().open_shared(token, password).await;
    let shared = settle(controller.notices(), result)?;

    println!("{} ({})", shared.title, language_label(&shared.language));
    println!();
    println!("{}", shared.code);
    Ok(())
}

/// Display name for a server-reported language, or the raw id if unknown.
fn language_label(raw: &str) -> String {
    raw.parse::<Language>()
        .map_or_else(|_| raw.to_string(), |language| language.label().to_string())
}
