//! Local rule-based mock web server library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rules;

pub use config::ServerConfig;
pub use http::MockServer;
pub use lifecycle::Shutdown;
pub use rules::{Resolver, RuleStore};
