//! Taskboard service binary.
//!
//! # Examples
//!
//! ```bash
//! # Run the API (default subcommand)
//! taskboard serve --port 8000
//!
//! # Run against the in-memory store with the demo accounts loaded
//! taskboard serve --seed
//!
//! # Create the demo accounts in the configured database
//! taskboard seed
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskboard::seed::seed_demo_users;
use taskboard::{open_storage, run_server, AppState, Config, LogFormat};

const DEFAULT_LOG_DIRECTIVES: &str = "taskboard=info,tasks=info,tower_http=info";

/// Task management API with an AI chat assistant.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Create the demo accounts and exit
    Seed,
}

#[derive(Parser, Debug)]
#[command(name = "serve")]
struct ServeArgs {
    /// Bind address (overrides `APP_HOST`)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides `APP_PORT`)
    #[arg(long)]
    port: Option<u16>,

    /// Create the demo accounts before serving
    #[arg(long, env = "SEED_DEMO_USERS")]
    seed: bool,
}

impl Cli {
    /// The requested command; a bare `taskboard` runs `serve` with its
    /// environment-backed defaults.
    fn command(self) -> Commands {
        self.command
            .unwrap_or_else(|| Commands::Serve(ServeArgs::parse_from(["serve"])))
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    match cli.command() {
        Commands::Serve(ServeArgs { host, port, seed }) => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let storage = open_storage(&config).await?;
            let state = AppState::new(&config, storage)?;
            if seed {
                seed_demo_users(state.storage.as_ref(), &state.hasher).await?;
            }

            info!(
                backend = state.storage.backend(),
                provider = state.assistant.provider_name(),
                model = %config.chat.model,
                chat_configured = state.assistant.is_configured(),
                "Starting Taskboard"
            );
            run_server(&config, state).await
        }
        Commands::Seed => {
            let storage = open_storage(&config).await?;
            let hasher = taskboard::auth::PasswordHasher::new(config.bcrypt_cost);
            let created = seed_demo_users(storage.as_ref(), &hasher).await?;
            info!(created, "Seeding complete");
            Ok(())
        }
    }
}
