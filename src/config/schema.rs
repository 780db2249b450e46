//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! Keys are camelCase so existing `config.json` files load unchanged.

use serde::{Deserialize, Serialize};

/// Response text used for domains that have no rule file yet.
pub const DEFAULT_RESPONSE_TEXT: &str = "No matching rule";

/// Root configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Body of the default response written into new rule files.
    pub default_response: String,

    /// Ports to listen on, each optionally with TLS.
    pub ports: Vec<PortConfig>,

    /// Rule cache settings.
    pub rules: RulesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_response: DEFAULT_RESPONSE_TEXT.to_string(),
            ports: vec![PortConfig::default()],
            rules: RulesConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// A single listening port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortConfig {
    /// Port number.
    pub port: u16,

    /// Terminate TLS on this port.
    pub https: bool,

    /// Path to certificate file (PEM). HTTPS only.
    pub cert: String,

    /// Path to private key file (PEM). HTTPS only.
    pub key: String,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            https: false,
            cert: String::new(),
            key: String::new(),
        }
    }
}

impl PortConfig {
    /// A plain HTTP port.
    pub fn http(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }
}

/// Rule cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesConfig {
    /// Seconds between full rebuilds of the rule cache.
    pub refresh_interval_secs: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 600,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeoutConfig {
    /// Request timeout (total time to produce a response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
