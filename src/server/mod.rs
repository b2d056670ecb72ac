//! HTTP surface: `GET /analysis` on top of an [`AnalyzerService`]

use crate::pipeline::analyzer::AnalyzerService;
use crate::streamer_core::config::RuntimeConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use warp::Filter;

pub mod handlers;
pub mod params;
pub mod response;
pub mod routes;

const ACCESS_LOG_TARGET: &str = "postflow::access";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<dyn AnalyzerService>,
    /// Root scope; cancelled on shutdown so in-flight analyses return early
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(analyzer: Arc<dyn AnalyzerService>, shutdown: CancellationToken) -> Self {
        Self { analyzer, shutdown }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },

    #[error("no socket address found for {0}")]
    NoAddress(String),

    #[error("failed to bind HTTP server: {0}")]
    Bind(#[from] warp::Error),

    #[error("failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),

    #[error("server did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Bind the routes to `address`. The returned future serves until
/// `state.shutdown` is cancelled, then drains open connections.
pub fn bind(
    address: SocketAddr,
    state: AppState,
) -> Result<(SocketAddr, impl Future<Output = ()>), ServerError> {
    let stop = state.shutdown.clone();
    let routes = routes::routes(state).with(warp::log(ACCESS_LOG_TARGET));

    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(address, async move { stop.cancelled().await })?;

    Ok((bound, server))
}

/// Serve until SIGINT/SIGTERM, then cancel in-flight work and wait up to
/// `shutdown_timeout` for the server to stop.
pub async fn run(config: &RuntimeConfig, analyzer: Arc<dyn AnalyzerService>) -> Result<(), ServerError> {
    let shutdown = CancellationToken::new();
    let address = resolve(&config.server_address()).await?;

    let (bound, server) = bind(address, AppState::new(analyzer, shutdown.clone()))?;
    log::info!("🚀 HTTP server listening on http://{}", bound);
    log::info!("   Analyze posts: GET http://{}/analysis?duration=5s&dimension=likes", bound);

    let server = tokio::spawn(server);

    let signal = shutdown_signal().await.map_err(ServerError::Signal)?;
    log::info!("🛑 Received {}, shutting down server...", signal);
    shutdown.cancel();

    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(joined) => {
            joined?;
            log::info!("✅ Server stopped");
            Ok(())
        }
        Err(_) => {
            log::error!("❌ Server did not stop within {:?}", config.shutdown_timeout);
            Err(ServerError::ShutdownTimeout(config.shutdown_timeout))
        }
    }
}

async fn resolve(address: &str) -> Result<SocketAddr, ServerError> {
    let mut addrs = tokio::net::lookup_host(address)
        .await
        .map_err(|source| ServerError::Resolve {
            address: address.to_string(),
            source,
        })?;
    addrs
        .next()
        .ok_or_else(|| ServerError::NoAddress(address.to_string()))
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
