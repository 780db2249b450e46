//! Rule engine subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, host, path)
//!     → resolver.rs (host → domain)
//!     → store.rs (cached rule file, refreshed on interval, lazily loaded on miss)
//!     → matcher.rs (first rule whose method + path match, in file order)
//!     → Return: matched rule's response or the file's default
//!
//! Rule file loading:
//!     storage.rs (<domain>.json bytes)
//!     → model.rs (serde RuleFile)
//!     → matcher.rs (compile regex paths)
//!     → CompiledRuleFile, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Persisted shapes and compiled shapes are separate types
//! - Regex paths compiled once per load, never per request
//! - Storage and clock are injected so expiry is testable

pub mod clock;
pub mod error;
pub mod matcher;
pub mod model;
pub mod resolver;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ResolveError, RuleError};
pub use matcher::{CompiledRule, CompiledRuleFile, PathMatcher, RequestView};
pub use model::{ResponseTemplate, Rule, RuleFile};
pub use resolver::Resolver;
pub use storage::{DirectoryStorage, MemoryStorage, RuleStorage};
pub use store::{LoadPolicy, RuleStore, DEFAULT_REFRESH_INTERVAL};
