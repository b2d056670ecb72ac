//! PostFlow analysis server
//!
//! Serves `GET /analysis?duration=<go-style duration>&dimension=<dimension>`.
//! Each request opens its own connection to `STREAM_URL`, folds posts until
//! the duration elapses, and replies with count, timestamp range and the
//! rounded average of the requested dimension.

use postflow::pipeline::StreamAnalyzer;
use postflow::server;
use postflow::streamer_core::{RuntimeConfig, SseClient};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let runtime_config = RuntimeConfig::from_env()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&runtime_config.rust_log),
    )
    .target(env_logger::Target::Stderr)
    .init();

    log::info!("🚀 Starting PostFlow analysis server");
    log::info!("📊 Configuration:");
    log::info!("   Stream URL: {}", runtime_config.stream_url);
    log::info!("   Listen: {}", runtime_config.server_address());
    log::info!("   Channel buffer: {}", runtime_config.channel_buffer);
    log::info!("   Max line: {} bytes", runtime_config.max_line_bytes);
    log::info!("   Shutdown timeout: {:?}", runtime_config.shutdown_timeout);

    let client = SseClient::from_config(&runtime_config)?;
    let analyzer = Arc::new(StreamAnalyzer::new(Arc::new(client)));

    if let Err(e) = server::run(&runtime_config, analyzer).await {
        log::error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
