//! CLI entry and dispatch.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scv_core::Language;
use scv_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "scv")]
#[command(version = "0.1")]
#[command(about = "SecureCode Vault client: store and share code snippets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Email and password for login and registration.
#[derive(clap::Args, Debug, Clone)]
struct CredentialArgs {
    /// Account email
    #[arg(long)]
    email: String,

    /// Account password (prompted on stdin when omitted)
    #[arg(long, env = "SCV_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check that the API is reachable
    Health,
    /// Create an account and log in
    Register(CredentialArgs),
    /// Log in and remember the session
    Login(CredentialArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage your snippets
    Snippets {
        #[command(subcommand)]
        command: SnippetCommands,
    },
    /// Open a snippet through a share link token
    Shared {
        /// Share token (the last path segment of a share link)
        #[arg(value_name = "TOKEN")]
        token: String,
        /// Password for a protected link
        #[arg(long)]
        password: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SnippetCommands {
    /// Lists your snippets
    List,
    /// Creates a snippet
    Create {
        /// Snippet title
        #[arg(long)]
        title: String,
        /// Language (python, javascript, typescript, java, cpp, html, css, sql)
        #[arg(long)]
        language: Option<Language>,
        /// Snippet code
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        code: Option<String>,
        /// Read the code from a file
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Shows a snippet
    Show {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Deletes a snippet
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Creates a 24-hour share link and copies it to the clipboard
    Share {
        #[arg(value_name = "ID")]
        id: i64,
        /// Require this password to open the link
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

/// A failure that was already printed as a notice.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation failed")
    }
}

impl std::error::Error for Reported {}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;
    tracing::debug!(path = %config::paths::config_path().display(), "config loaded");

    match cli.command {
        Commands::Health => commands::health::run(&config).await,
        Commands::Register(args) => {
            commands::auth::register(&config, &args.email, args.password).await
        }
        Commands::Login(args) => commands::auth::login(&config, &args.email, args.password).await,
        Commands::Logout => commands::auth::logout(&config),
        Commands::Whoami => commands::auth::whoami(&config).await,

        Commands::Snippets { command } => match command {
            SnippetCommands::List => commands::snippets::list(&config).await,
            SnippetCommands::Create {
                title,
                language,
                code,
                file,
            } => {
                let code = match (code, file) {
                    (Some(code), _) => code,
                    (None, Some(path)) => fs::read_to_string(&path)
                        .with_context(|| format!("read code from {}", path.display()))?,
                    (None, None) => anyhow::bail!("Provide the code with --code or --file"),
                };
                commands::snippets::create(&config, &title, language, &code).await
            }
            SnippetCommands::Show { id } => commands::snippets::show(&config, id).await,
            SnippetCommands::Delete { id } => commands::snippets::delete(&config, id).await,
            SnippetCommands::Share { id, password } => {
                commands::snippets::share(&config, id, password.as_deref()).await
            }
        },

        Commands::Shared { token, password } => {
            commands::snippets::open_shared(&config, &token, password.as_deref()).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
