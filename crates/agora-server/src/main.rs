//! # agora-server
//!
//! HTTP backend for the agora social network.
//!
//! This binary provides:
//! - the **social graph** (friend requests with mirrored status, follow
//!   graph) as remote procedures
//! - **direct and group messaging** with read tracking and unread counts
//! - the **call-signaling rendezvous** clients poll to exchange WebRTC
//!   offers, answers, and ICE candidates
//! - a minimal **profile directory** for display names
//! - **per-caller rate limiting** and a token-gated admin API
//!
//! State lives in in-memory keyed maps; persistence is deliberately out of
//! scope for this service.

mod api;
mod auth;
mod config;
mod error;
mod rate_limit;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug")),
        )
        .init();

    info!("Starting agora server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        instance = %config.instance_name,
        identity_header = %config.identity_header,
        admin_enabled = config.admin_token.is_some(),
        "Loaded configuration"
    );

    let http_addr = config.http_addr;
    let state = AppState::new(config);

    // -----------------------------------------------------------------------
    // 3. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
