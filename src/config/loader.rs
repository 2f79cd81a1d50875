//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("rewrite-proxy-{}-{}.toml", name, std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_file() {
        let path = write_temp("valid", "[fetcher]\nendpoint = \"https://fetch.example/\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.fetcher.endpoint, "https://fetch.example/");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let path = write_temp("parse", "[listener\n");
        assert!(matches!(load_config(&path).unwrap_err(), ConfigError::Parse(_)));
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_validation_error_message() {
        let path = write_temp("invalid", "[fetcher]\nendpoint = \"nope\"\n");
        let err = load_config(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: fetcher endpoint `nope` is not an http(s) URL"
        );
        fs::remove_file(path).ok();
    }
}
