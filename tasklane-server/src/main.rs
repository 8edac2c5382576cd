//! Tasklane reorder authority server.
//!
//! An axum JSON server that owns the canonical positions and version
//! counters for scope-local item lists. Clients reorder optimistically and
//! reconcile against the responses served here.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9100
//! cargo run --bin tasklane-server
//!
//! # Run on custom address
//! cargo run --bin tasklane-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TASKLANE_ADDR=127.0.0.1:8080 cargo run --bin tasklane-server
//! ```

use std::sync::Arc;

use clap::Parser;
use tasklane_server::config::{ServerCliArgs, ServerConfig};
use tasklane_server::http;
use tasklane_server::store::ListStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting tasklane reorder authority");

    let store = Arc::new(ListStore::with_config(
        config.default_spacing,
        config.initial_position,
        config.max_batch_size,
    ));

    match http::start_server(&config.bind_addr, store).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "reorder authority listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
