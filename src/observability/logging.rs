//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Honour `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - `RUST_LOG` always wins so ad-hoc debugging needs no flag changes
//! - The fallback level applies to this crate and to `tower_http` only

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("mock_host={level},tower_http={level}")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
