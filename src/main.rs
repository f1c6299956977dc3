//! edge-server binary.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!  request ──────▶│ before-hooks (rate limit, ...)               │
//!                 │      │                                       │
//!                 │      ├── /api/* ──▶ ApiRouter ──▶ handler    │
//!                 │      └── else ────▶ StaticFiles (public/)    │
//!                 │      │                                       │
//!  response ◀─────│ after-hooks (metrics, ...)                   │
//!                 └──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use edge_server::config::Cli;
use edge_server::lifecycle::{wait_for_signal, Shutdown};
use edge_server::observability::{init_metrics, init_tracing, MetricsHook};
use edge_server::routing::{json, ApiRequest, HandlerResult};
use edge_server::security::{RateLimitHook, RateLimiter};
use edge_server::{Dispatcher, EdgeServer};

async fn health(_req: ApiRequest) -> HandlerResult {
    Ok(json(serde_json::json!({ "status": "ok" })))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.resolve()?;

    init_tracing(&config.observability.log_level);
    tracing::info!("edge-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        public_dir = %config.static_files.root.display(),
        api_prefix = %config.api.prefix,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let limiter = Arc::new(RateLimiter::new());
    let mut dispatcher = Dispatcher::with_limiter(&config, Arc::clone(&limiter));
    dispatcher
        .api_mut()
        .get(format!("{}health", config.api.prefix), health)?;
    if config.rate_limit.enabled {
        dispatcher.hooks_mut().add(
            edge_server::http::Stage::Before,
            "rate-limit",
            Arc::new(RateLimitHook::new(limiter, &config.rate_limit)),
        );
    }
    if config.observability.metrics_enabled {
        dispatcher
            .hooks_mut()
            .add(edge_server::http::Stage::After, "metrics", Arc::new(MetricsHook));
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let trigger = Arc::clone(&shutdown);
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    EdgeServer::new(dispatcher, &config)
        .run(listener, &shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
