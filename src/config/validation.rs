use super::types::BindMode;
use super::Config;
use anyhow::Result;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ConfigValidationError {
            path: "server.port".to_string(),
            message: "Port must be greater than 0".to_string(),
        });
    }

    if config.server.bind == BindMode::Custom && config.server.custom_bind_host.is_none() {
        errors.push(ConfigValidationError {
            path: "server.customBindHost".to_string(),
            message: "Custom bind mode requires a host".to_string(),
        });
    }

    for (i, proxy) in config.server.trusted_proxies.iter().enumerate() {
        if let Err(e) = proxy.parse::<ipnet::IpNet>() {
            errors.push(ConfigValidationError {
                path: format!("server.trustedProxies[{i}]"),
                message: format!("'{proxy}' is not a valid subnet: {e}"),
            });
        }
    }

    if config.server.trusted_proxies.is_empty() {
        warn!("No trusted proxies configured; the SSO panel will show a warning");
    }

    if config.server.roles.iter().all(|r| r.trim().is_empty()) {
        errors.push(ConfigValidationError {
            path: "server.roles".to_string(),
            message: "At least one role name is required".to_string(),
        });
    }

    if let Err(e) = url::Url::parse(&config.client.base_url) {
        errors.push(ConfigValidationError {
            path: "client.baseUrl".to_string(),
            message: format!("Invalid URL: {e}"),
        });
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_empty());
    }

    #[test]
    fn invalid_subnet_reported_with_index() {
        let mut config = Config::default();
        config.server.trusted_proxies = vec!["10.0.0.0/8".into(), "not-a-net".into()];

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "server.trustedProxies[1]");
    }

    #[test]
    fn custom_bind_requires_host() {
        let mut config = Config::default();
        config.server.bind = BindMode::Custom;
        assert_eq!(validate_config(&config)[0].path, "server.customBindHost");
    }

    #[test]
    fn bad_base_url_fails_object_validation() {
        let mut config = Config::default();
        config.client.base_url = "::nope".into();
        config.server.port = 0;

        let err = validate_config_object(&config).unwrap_err().to_string();
        assert!(err.contains("server.port"));
        assert!(err.contains("client.baseUrl"));
    }

    #[test]
    fn empty_role_list_rejected() {
        let mut config = Config::default();
        config.server.roles = vec![];
        assert_eq!(validate_config(&config)[0].path, "server.roles");
    }
}
