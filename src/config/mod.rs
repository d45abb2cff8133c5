mod defaults;
mod io;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use types::*;
pub use validation::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level headerauth configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(find_config_file)
            .unwrap_or_else(|| PathBuf::from("headerauth.json"));

        let mut config = if config_path.exists() {
            info!("Loading config from {}", config_path.display());
            load_config_file(&config_path)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config::default();
        let value = serde_json::to_value(&config)?;
        write_config_file(Path::new(path), &value)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("HEADERAUTH_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid HEADERAUTH_PORT value '{}'", port),
            }
        }

        if let Ok(bind) = std::env::var("HEADERAUTH_BIND") {
            match bind.parse() {
                Ok(mode) => self.server.bind = mode,
                Err(e) => warn!("Ignoring HEADERAUTH_BIND: {}", e),
            }
        }

        // The same token guards the backend and authenticates the client.
        if let Ok(token) = std::env::var("HEADERAUTH_TOKEN") {
            self.server.auth.token = Some(token.clone());
            self.client.token = Some(token);
        }

        if let Ok(url) = std::env::var("HEADERAUTH_URL") {
            self.client.base_url = url;
        }

        if let Ok(proxies) = std::env::var("HEADERAUTH_TRUSTED_PROXIES") {
            self.server.trusted_proxies = split_list(&proxies);
        }

        if let Ok(file) = std::env::var("HEADERAUTH_STATE_FILE") {
            self.server.state_file = Some(PathBuf::from(file));
        }
    }
}

/// Split a comma separated list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("headerauth.json"),
        PathBuf::from("headerauth.yaml"),
        PathBuf::from("headerauth.yml"),
        PathBuf::from("headerauth.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".headerauth").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Load configuration from a file path.
fn load_config_file(path: &Path) -> Result<Config> {
    let value = read_config_value(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid configuration in '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.bind, BindMode::Loopback);
        assert_eq!(config.server.roles, vec!["Admin", "Reader"]);
        assert!(config.server.trusted_proxies.is_empty());
        assert_eq!(config.client.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn load_yaml_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("headerauth.yaml");
        fs::write(
            &file,
            "server:\n  port: 9100\n  trustedProxies: [\"10.0.0.0/8\"]\nlogging:\n  level: debug\n",
        )
        .unwrap();

        let config = load_config_file(&file).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.trusted_proxies, vec!["10.0.0.0/8"]);
        assert_eq!(config.logging.level, LoggingLevel::Debug);
        // untouched sections keep their defaults
        assert_eq!(config.server.roles, vec!["Admin", "Reader"]);
    }

    #[test]
    fn write_default_round_trips() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("headerauth.json");
        Config::write_default(file.to_str().unwrap()).unwrap();

        let config = load_config_file(&file).unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn split_list_trims_and_skips_empty() {
        assert_eq!(
            split_list(" 10.0.0.0/8, ,192.168.1.0/24 "),
            vec!["10.0.0.0/8", "192.168.1.0/24"]
        );
        assert!(split_list("").is_empty());
    }
}
