use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;

use guardian::api::ApiClient;
use guardian::app::{App, AppEvent};
use guardian::auth::{AuthError, SessionStore};
use guardian::chat::ChatHistory;
use guardian::config::Config;
use guardian::storage::Database;
use guardian::ui;

/// Get the config directory path (~/.config/guardian/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("guardian"))
}

#[derive(Parser, Debug)]
#[command(
    name = "guardian",
    about = "Terminal dashboard for geotagged incident reports"
)]
struct Args {
    /// Log in with this email (prompts for the password) and exit
    #[arg(long, value_name = "EMAIL")]
    login: Option<String>,

    /// Clear the stored session and chat history, then exit
    #[arg(long)]
    logout: bool,

    /// Reset the local database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Path to the config file (default: ~/.config/guardian/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // The session token lives in this directory; user-only access.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    let db_path = config_dir.join("guardian.db");

    // Handle --reset-db flag
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = Database::open(db_path_str)
        .await
        .context("Failed to open database")?;

    let mut sessions = SessionStore::load(db.clone())
        .await
        .context("Failed to load session store")?;

    // Handle --logout flag
    if args.logout {
        sessions.logout().await.context("Logout failed")?;
        println!("Logged out. Session and chat history cleared.");
        return Ok(());
    }

    // Handle --login flag
    if let Some(email) = &args.login {
        let password = prompt_password()?;
        let auth_base = config.auth_base()?;
        match sessions.login(&auth_base, email, &password).await {
            Ok(session) => {
                println!("Logged in as {}.", session.email);
                return Ok(());
            }
            Err(AuthError::Rejected { status, .. }) => {
                eprintln!("Error: credentials rejected (status {}).", status);
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Protected boundary: the dashboard only runs with a session.
    let token = match sessions.current_token() {
        Ok(token) => token,
        Err(AuthError::NotAuthenticated) => {
            eprintln!("Error: not logged in.");
            eprintln!();
            eprintln!("To get started, authenticate first:");
            eprintln!("  guardian --login you@example.com");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let api = ApiClient::new(config.api_base()?, config.chat_base()?, token)
        .context("Failed to build API client")?;
    let chat = ChatHistory::load(db.clone())
        .await
        .context("Failed to load chat history")?;

    let mut app = App::new(db, api, config, chat);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}

/// Read the password from the terminal. Line-based; the login flow is a
/// one-off command, not part of the TUI.
fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }
    Ok(password)
}
