//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve paths → Ensure rules dir → Load config → Build rule store → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Every port drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)
//! - Shutdown has timeout: connections are cut after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
