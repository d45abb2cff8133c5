use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

// ============================================================================
// Server Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    #[default]
    Loopback,
    Lan,
    Custom,
}

impl std::str::FromStr for BindMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loopback" => Ok(Self::Loopback),
            "lan" => Ok(Self::Lan),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("invalid bind mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerAuthConfig {
    /// Bearer token required on every API route. Unset means local-only access.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bind: BindMode,
    pub custom_bind_host: Option<String>,
    #[serde(default)]
    pub auth: ServerAuthConfig,
    /// Subnets (CIDR notation) of the proxies allowed to set trusted headers.
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    /// Role names served to the role directory.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    /// Where authenticator settings are persisted. In-memory only when unset.
    pub state_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: BindMode::Loopback,
            custom_bind_host: None,
            auth: ServerAuthConfig::default(),
            trusted_proxies: Vec::new(),
            roles: default_roles(),
            state_file: None,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_roles() -> Vec<String> {
    DEFAULT_ROLES.iter().map(|r| r.to_string()).collect()
}

// ============================================================================
// Client Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the host API. Plugin paths are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub token: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_PORT}")
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LoggingLevel,
    #[serde(default)]
    pub json: bool,
}
