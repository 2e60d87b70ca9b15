//! HTTP server: shared state, router and listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tasks::{Assistant, DeepSeekProvider};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use crate::auth::{PasswordHasher, TokenService};
use crate::config::Config;
use crate::handlers;
use crate::storage::{MemoryStorage, PostgresStorage, Storage};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Headroom on top of the chat timeout before the server gives up on a request.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
    pub assistant: Assistant,
}

impl AppState {
    /// Wire services from configuration around an existing store.
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let provider = DeepSeekProvider::new(config.chat.clone())
            .context("Failed to create chat-completion client")?;
        Ok(Self::with_assistant(
            config,
            storage,
            Assistant::new(Arc::new(provider)),
        ))
    }

    pub fn with_assistant(config: &Config, storage: Arc<dyn Storage>, assistant: Assistant) -> Self {
        Self {
            storage,
            tokens: TokenService::new(&config.jwt),
            hasher: PasswordHasher::new(config.bcrypt_cost),
            assistant,
        }
    }
}

/// Open the configured store: PostgreSQL when a URL is set, memory otherwise.
pub async fn open_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresStorage::connect(url, config.database_max_connections)
                .await
                .context("Failed to connect to database")?;
            store.migrate().await.context("Failed to run migrations")?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL is not set; using in-memory storage, data will not persist");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/tasks/",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/chat/query", post(handlers::chat::query))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

/// Request timeout derived from the chat timeout.
pub fn request_timeout(config: &Config) -> Duration {
    config.chat.timeout.saturating_add(REQUEST_TIMEOUT_MARGIN)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn run_server(config: &Config, state: AppState) -> Result<()> {
    let app = build_router(state, request_timeout(config));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    let local: SocketAddr = listener.local_addr().context("Failed to read bound address")?;
    info!(addr = %local, "Taskboard API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout_adds_margin() {
        let mut config = Config::new("secret");
        config.chat.timeout = Duration::from_secs(30);
        assert_eq!(request_timeout(&config), Duration::from_secs(45));

        config.chat.timeout = Duration::MAX;
        assert_eq!(request_timeout(&config), Duration::MAX);
    }
}
