//! GoBarber CLI - manage a GoBarber account session from the terminal.
//!
//! The session is restored from the configured store on startup, and each
//! subcommand runs inside a `SessionProvider` scope.

mod app;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gobarber_core::{ApiClient, Config, SessionManager, SessionProvider, StoreBackend};

use app::App;

#[derive(Parser)]
#[command(name = "gobarber", version, about = "Sign in to GoBarber and manage your profile")]
struct Cli {
    /// Backend URL, overriding the saved config
    #[arg(long, env = "GOBARBER_API_URL", global = true)]
    api_url: Option<String>,

    /// Where to keep the session between runs
    #[arg(long, value_enum, global = true)]
    store: Option<StoreArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long, env = "GOBARBER_EMAIL")]
        email: Option<String>,

        #[arg(long, env = "GOBARBER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Change name, email or password
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Prompt for the current and a new password
        #[arg(long)]
        password: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreArg {
    File,
    Keyring,
    Memory,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::File => StoreBackend::File,
            StoreArg::Keyring => StoreBackend::Keyring,
            StoreArg::Memory => StoreBackend::Memory,
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and, when a log directory is available, to a daily
/// rolling file. The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file = log_dir.and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("gobarber")
            .filename_suffix("log")
            .build(dir)
            .ok()
    });
    let (file_layer, guard) = match file {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring unreadable config: {}", e);
            Config::default()
        }
    };
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(store) = cli.store {
        config.store = store.into();
    }

    let _log_guard = init_tracing(config.log_dir().ok());
    info!(api = %config.api_base_url, store = ?config.store, "GoBarber CLI starting");

    let store = config.open_store().context("Failed to open session store")?;
    let api = ApiClient::new(config.api_base_url.clone()).context("Failed to build HTTP client")?;
    let session = SessionManager::start(store, Arc::new(api.clone()));

    let result = SessionProvider::scope(session, run(cli.command, config, api)).await;
    if let Err(ref e) = result {
        warn!(error = %e, "Command failed");
    }
    result
}

async fn run(command: Command, config: Config, api: ApiClient) -> Result<()> {
    let mut app = App::new(config, api).await?;

    match command {
        Command::Login { email, password } => app.login(email, password).await,
        Command::Logout => app.logout().await,
        Command::Whoami => app.whoami(),
        Command::Profile {
            name,
            email,
            password,
        } => app.edit_profile(name, email, password).await,
    }
}
