//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS by default, optional origin allow-list
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use roster_store::SharedStore;

use crate::routes;

/// Default listening port when `PORT` is unset
pub const DEFAULT_PORT: u16 = 5000;

/// Which origins may call the API from a browser
#[derive(Debug, Clone, Default)]
pub enum CorsPolicy {
    /// Any origin, method and header
    #[default]
    Permissive,
    /// Only the listed origins
    Origins(Vec<HeaderValue>),
}

impl CorsPolicy {
    /// Build a policy from origin strings; an empty list means permissive.
    pub fn from_origins<I, T>(origins: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let parsed = origins
            .into_iter()
            .map(|origin| {
                let origin = origin.as_ref();
                HeaderValue::from_str(origin).map_err(|_| ServerError::InvalidOrigin {
                    origin: origin.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(if parsed.is_empty() {
            Self::Permissive
        } else {
            Self::Origins(parsed)
        })
    }

    fn layer(&self) -> CorsLayer {
        match self {
            Self::Permissive => CorsLayer::permissive(),
            Self::Origins(origins) => CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins.clone()))
                .allow_methods(Any)
                .allow_headers(Any),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    pub bind_addr: SocketAddr,

    pub cors: CorsPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            cors: CorsPolicy::Permissive,
        }
    }
}

/// Shared application state. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Student records
    pub students: SharedStore,
    /// Collection counted by `GET /test`
    pub probe: SharedStore,
}

impl AppState {
    pub fn new(students: SharedStore, probe: SharedStore) -> Self {
        Self { students, probe }
    }
}

/// Build the application router with all routes and middleware
pub fn build_router(state: AppState, cors: &CorsPolicy) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::students::router())
        .merge(routes::probe::router())
        .fallback(routes::no_route)
        .method_not_allowed_fallback(routes::wrong_method)
        .layer(cors.layer())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let store = MemoryStore::new();
/// let state = AppState::new(
///     Arc::new(store.collection("students")),
///     Arc::new(store.collection("test")),
/// );
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    if matches!(config.cors, CorsPolicy::Permissive) {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
    }

    tracing::info!(
        students = %state.students.collection(),
        probe = %state.probe.collection(),
        "store collections ready"
    );

    let app = build_router(state, &config.cors);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::warn!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid CORS origin '{origin}'")]
    InvalidOrigin { origin: String },
}
