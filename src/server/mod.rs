use crate::config::Config;
use crate::simulator::{self, TrackStore};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::TimeDelta;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Simulated tracks, alive for the whole process
    pub tracks: TrackStore,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            tracks: TrackStore::new(),
        }
    }

    /// Resolve a request path inside the streams directory
    pub fn source_path(&self, relative: &str) -> PathBuf {
        self.config.simulator.streams_dir.join(relative)
    }

    pub fn lookahead(&self) -> TimeDelta {
        self.config.simulator.lookahead()
    }

    pub fn hold_open(&self) -> Duration {
        self.config.simulator.hold_open()
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/tracks", get(list_tracks))
        .merge(simulator::sim_router(ctx.config.simulator.prefix()))
        .layer(TraceLayer::new_for_http());

    if ctx.config.server.cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers([header::CONTENT_TYPE, header::RANGE]);
        app = app.layer(cors);
    }

    app.with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn list_tracks(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.tracks.snapshots())
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    log_streams_dir(&config.simulator.streams_dir);

    let prefix = config.simulator.prefix().to_string();
    let ctx = AppContext::new(config);
    let tracks = ctx.tracks.clone();
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);
    tracing::info!("Simulated tracks served under /{}/{{track}}/", prefix);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(termination_signal(), tracks))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn log_streams_dir(dir: &Path) {
    match std::fs::canonicalize(dir) {
        Ok(path) => tracing::info!("Serving streams from {:?}", path),
        Err(e) => tracing::warn!("Streams directory {:?} is not accessible: {}", dir, e),
    }
}

/// Resolves with the signal name on Ctrl+C or SIGTERM.
async fn termination_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Graceful-shutdown trigger. Held-open segment and manifest requests are
/// still in flight at this point and keep the server alive until their
/// delay elapses or the client goes away.
async fn shutdown_on(signal: impl Future<Output = &'static str>, tracks: TrackStore) {
    let signal = signal.await;
    tracing::info!(signal, tracks = tracks.len(), "Shutdown signal received");
}
