//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse & deserialize, or write defaults if missing)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared with the server, the rule store and observability
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ServerConfig;
pub use schema::PortConfig;
pub use schema::RulesConfig;
pub use schema::TimeoutConfig;
pub use schema::ObservabilityConfig;
