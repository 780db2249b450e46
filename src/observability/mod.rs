//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or the CLI level)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Metric updates are cheap no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
