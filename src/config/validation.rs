//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports non-zero and unique)
//! - Check HTTPS ports name certificate and key files that exist
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoPorts,
    ZeroPort,
    DuplicatePort(u16),
    MissingTlsMaterial(u16),
    TlsFileNotFound { port: u16, path: String },
    ZeroRefreshInterval,
    ZeroRequestTimeout,
    InvalidMetricsAddress(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NoPorts => write!(f, "no ports configured"),
            ValidationError::ZeroPort => write!(f, "port 0 is not allowed"),
            ValidationError::DuplicatePort(port) => write!(f, "port {} is configured more than once", port),
            ValidationError::MissingTlsMaterial(port) => {
                write!(f, "HTTPS port {} is missing a certificate or key", port)
            }
            ValidationError::TlsFileNotFound { port, path } => {
                write!(f, "HTTPS port {}: file not found: {}", port, path)
            }
            ValidationError::ZeroRefreshInterval => write!(f, "rules.refreshIntervalSecs must be > 0"),
            ValidationError::ZeroRequestTimeout => write!(f, "timeouts.requestSecs must be > 0"),
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "invalid metrics address: {}", addr)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check `config` for semantic problems, reporting every one found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.ports.is_empty() {
        errors.push(ValidationError::NoPorts);
    }

    let mut seen = HashSet::new();
    for port in &config.ports {
        if port.port == 0 {
            errors.push(ValidationError::ZeroPort);
        } else if !seen.insert(port.port) {
            errors.push(ValidationError::DuplicatePort(port.port));
        }

        if !port.https {
            continue;
        }
        if port.cert.is_empty() || port.key.is_empty() {
            errors.push(ValidationError::MissingTlsMaterial(port.port));
            continue;
        }
        for path in [&port.cert, &port.key] {
            if !Path::new(path).exists() {
                errors.push(ValidationError::TlsFileNotFound {
                    port: port.port,
                    path: path.clone(),
                });
            }
        }
    }

    if config.rules.refresh_interval_secs == 0 {
        errors.push(ValidationError::ZeroRefreshInterval);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PortConfig;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServerConfig::default();
        config.ports = vec![
            PortConfig::http(8080),
            PortConfig::http(8080),
            PortConfig::http(0),
            PortConfig {
                port: 8443,
                https: true,
                cert: String::new(),
                key: String::new(),
            },
        ];
        config.rules.refresh_interval_secs = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not an address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicatePort(8080),
                ValidationError::ZeroPort,
                ValidationError::MissingTlsMaterial(8443),
                ValidationError::ZeroRefreshInterval,
                ValidationError::InvalidMetricsAddress("not an address".to_string()),
            ]
        );
    }

    #[test]
    fn no_ports_is_an_error() {
        let mut config = ServerConfig::default();
        config.ports.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoPorts]));
    }

    #[test]
    fn https_files_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let cert = tmp.path().join("server.crt");
        std::fs::write(&cert, "cert").unwrap();
        let key = tmp.path().join("server.key");

        let mut config = ServerConfig::default();
        config.ports = vec![PortConfig {
            port: 8443,
            https: true,
            cert: cert.display().to_string(),
            key: key.display().to_string(),
        }];

        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::TlsFileNotFound {
                port: 8443,
                path: key.display().to_string(),
            }])
        );
    }
}
