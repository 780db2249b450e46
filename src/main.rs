//! mock-host: a local rule-based mock web server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (one listener per configured port, TLS optional)
//!                          │
//!                          ▼
//!                     rules::resolver ── Host → domain
//!                          │
//!                          ▼
//!                     rules::store ──── cached rule files, rebuilt on interval
//!                          │               │
//!                          │               ▼
//!                          │          rules/<domain>.json
//!                          ▼
//!     Client Response ◀── http::response (status, headers, body or file)
//! ```
//!
//! Cross-cutting: `config` (config.json / .toml), `observability` (tracing,
//! Prometheus), `lifecycle` (paths, banner, signals, graceful shutdown).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use mock_host::config::loader::load_or_create_config;
use mock_host::http::MockServer;
use mock_host::lifecycle::startup::{
    ensure_dir, executable_dir, print_banner, resolve_path, DEFAULT_CONFIG_FILE, DEFAULT_RULES_DIR,
};
use mock_host::lifecycle::{signals, Shutdown};
use mock_host::observability::{logging, metrics};
use mock_host::rules::{DirectoryStorage, Resolver, RuleStore, SystemClock};

/// Local mock web server answering from per-domain JSON rule files.
#[derive(Debug, Parser)]
#[command(name = "mock-host", version, about)]
struct Cli {
    /// Config file (JSON, or TOML by extension). Relative paths resolve against the executable's directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rules directory. Relative paths resolve against the executable's directory.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    print_banner();

    let base = executable_dir()?;
    let config_path = resolve_path(&base, cli.config.as_deref(), DEFAULT_CONFIG_FILE);
    let rules_dir = resolve_path(&base, cli.rules.as_deref(), DEFAULT_RULES_DIR);

    ensure_dir(&rules_dir)?;
    let config = load_or_create_config(&config_path)?;

    tracing::info!(
        config = %config_path.display(),
        rules = %rules_dir.display(),
        ports = ?config.ports.iter().map(|p| p.port).collect::<Vec<_>>(),
        refresh_interval_secs = config.rules.refresh_interval_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let storage = DirectoryStorage::open(&rules_dir)?;
    let store = RuleStore::with_clock(
        Arc::new(storage),
        Arc::new(SystemClock),
        Duration::from_secs(config.rules.refresh_interval_secs),
        config.default_response.clone(),
    );
    let resolver = Resolver::new(Arc::new(store));
    let server = MockServer::new(config, resolver);

    let shutdown = Shutdown::new();
    let mut serving = tokio::spawn(server.run(shutdown.subscribe()));

    let signalled = tokio::select! {
        _ = signals::wait_for_signal() => true,
        result = &mut serving => {
            result??;
            false
        }
    };
    if signalled {
        shutdown.trigger();
        serving.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
