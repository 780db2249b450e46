//! Rule engine error definitions.

use thiserror::Error;

/// Errors raised while reading, parsing or compiling rule files.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Rule storage could not be enumerated, read or written.
    #[error("Rule storage unavailable at {location}: {source}")]
    Storage {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Rule file content is not a valid rule file.
    #[error("Malformed rule file {location}: {source}")]
    Malformed {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// A `^...$` path failed to compile as a regular expression.
    #[error("Invalid path pattern {pattern:?} in {location}: {source}")]
    InvalidPattern {
        location: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The domain cannot name a rule file.
    #[error("Invalid domain {0:?}")]
    InvalidDomain(String),
}

/// Failure surfaced by the resolver. "No rule matched" is never an error.
#[derive(Debug, Error)]
#[error("Failed to resolve response for {domain}: {source}")]
pub struct ResolveError {
    pub domain: String,
    #[source]
    pub source: RuleError,
}
