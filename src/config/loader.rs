//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Toml(toml::de::Error),
    Serialize(String),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Parse error: {}", e),
            ConfigError::Toml(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// On-disk config format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Load and validate configuration from a JSON or TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ServerConfig = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&content).map_err(ConfigError::Json)?,
        ConfigFormat::Toml => toml::from_str(&content).map_err(ConfigError::Toml)?,
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the configuration, writing a default file first if none exists.
pub fn load_or_create_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    let config = ServerConfig::default();
    write_config(path, &config)?;
    tracing::info!(path = %path.display(), "Created default configuration file");
    Ok(config)
}

/// Serialize `config` to `path` in the format its extension implies.
pub fn write_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    let content = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?,
    };
    fs::write(path, content).map_err(ConfigError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{PortConfig, DEFAULT_RESPONSE_TEXT};

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("config.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("config.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Json);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let config = load_or_create_config(&path).unwrap();
        assert_eq!(config.ports, vec![PortConfig::http(8080)]);
        assert_eq!(config.default_response, DEFAULT_RESPONSE_TEXT);
        assert!(path.is_file());

        let reloaded = load_config(&path).unwrap();
        assert_eq!(reloaded.ports, config.ports);
        assert_eq!(reloaded.default_response, config.default_response);
    }

    #[test]
    fn toml_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = ServerConfig::default();
        config.ports = vec![PortConfig::http(9001), PortConfig::http(9002)];
        config.default_response = "toml says no".to_string();
        write_config(&path, &config).unwrap();

        let reloaded = load_config(&path).unwrap();
        assert_eq!(reloaded.ports, config.ports);
        assert_eq!(reloaded.default_response, "toml says no");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ \"ports\": [").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"ports": []}"#).unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::NoPorts]);
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }
}
