//! Typed authenticator settings as persisted by the backend.
//!
//! The client side treats configurations as opaque maps; only the backend
//! needs to know the concrete shape, apply defaults and reject invalid input.

use super::configuration::{fields, Configuration};
use crate::config::{DEFAULT_ROLES_HEADER, DEFAULT_USERNAME_HEADER};
use serde::{Deserialize, Serialize};

/// Reasons a settings payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{0} must not be empty")]
    Required(&'static str),
    #[error("{field} must not be empty when {governed_by} is enabled")]
    RequiredWhen {
        field: &'static str,
        governed_by: &'static str,
    },
    #[error("invalid settings: {0}")]
    Malformed(String),
}

/// Settings of the SSO header authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoAuthSettings {
    pub username_header: String,
    #[serde(default)]
    pub fullname_header: Option<String>,
    #[serde(default)]
    pub email_header: Option<String>,
    #[serde(default)]
    pub default_group: Option<String>,
    #[serde(default)]
    pub auto_create_user: bool,
    #[serde(default)]
    pub require_trusted_proxies: bool,
    /// Display-only copy of the server's trusted proxy subnets.
    #[serde(default)]
    pub trusted_proxies: Option<String>,
    #[serde(default)]
    pub default_email_domain: Option<String>,
    #[serde(default)]
    pub sync_roles: bool,
    #[serde(default)]
    pub roles_header: Option<String>,
}

impl Default for SsoAuthSettings {
    fn default() -> Self {
        Self {
            username_header: DEFAULT_USERNAME_HEADER.to_string(),
            fullname_header: None,
            email_header: None,
            default_group: None,
            auto_create_user: true,
            require_trusted_proxies: true,
            trusted_proxies: None,
            default_email_domain: None,
            sync_roles: false,
            roles_header: Some(DEFAULT_ROLES_HEADER.to_string()),
        }
    }
}

impl SsoAuthSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        require_non_empty(fields::USERNAME_HEADER, Some(&self.username_header))?;
        if self.sync_roles && is_blank(self.roles_header.as_deref()) {
            return Err(SettingsError::RequiredWhen {
                field: fields::ROLES_HEADER,
                governed_by: fields::SYNC_ROLES,
            });
        }
        Ok(())
    }

    /// A copy with the display-only trusted proxies replaced.
    pub fn with_trusted_proxies(&self, trusted_proxies: Option<String>) -> Self {
        Self {
            trusted_proxies,
            ..self.clone()
        }
    }
}

/// Settings of the generic trusted HTTP headers authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedHeaderSettings {
    pub username_header: String,
    #[serde(default)]
    pub fullname_header: Option<String>,
    #[serde(default)]
    pub email_header: Option<String>,
    #[serde(default)]
    pub default_group: Option<String>,
    #[serde(default)]
    pub auto_create_user: bool,
}

impl Default for TrustedHeaderSettings {
    fn default() -> Self {
        Self {
            username_header: DEFAULT_USERNAME_HEADER.to_string(),
            fullname_header: None,
            email_header: None,
            default_group: None,
            auto_create_user: true,
        }
    }
}

impl TrustedHeaderSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        require_non_empty(fields::USERNAME_HEADER, Some(&self.username_header))
    }
}

/// Decode a settings type from an opaque configuration.
pub fn decode_settings<T>(config: &Configuration) -> Result<T, SettingsError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(config.clone().into_value())
        .map_err(|e| SettingsError::Malformed(e.to_string()))
}

/// Encode a settings type into an opaque configuration.
pub fn encode_settings<T: Serialize>(settings: &T) -> Result<Configuration, SettingsError> {
    let value = serde_json::to_value(settings).map_err(|e| SettingsError::Malformed(e.to_string()))?;
    Configuration::from_value(value).map_err(|e| SettingsError::Malformed(e.to_string()))
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn require_non_empty(field: &'static str, value: Option<&str>) -> Result<(), SettingsError> {
    if is_blank(value) {
        Err(SettingsError::Required(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sso_defaults() {
        let settings = SsoAuthSettings::default();
        assert_eq!(settings.username_header, "Remote-User");
        assert!(settings.auto_create_user);
        assert!(settings.require_trusted_proxies);
        assert!(!settings.sync_roles);
        assert_eq!(settings.roles_header.as_deref(), Some("Roles"));
    }

    #[test]
    fn missing_username_header_is_malformed() {
        let config = Configuration::from_value(json!({"auto_create_user": true})).unwrap();
        let err = decode_settings::<TrustedHeaderSettings>(&config).unwrap_err();
        assert!(matches!(err, SettingsError::Malformed(msg) if msg.contains("username_header")));
    }

    #[test]
    fn blank_username_header_rejected() {
        let settings = TrustedHeaderSettings {
            username_header: "  ".into(),
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::Required("username_header"))
        );
    }

    #[test]
    fn roles_header_required_only_when_syncing() {
        let mut settings = SsoAuthSettings {
            roles_header: None,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());

        settings.sync_roles = true;
        assert_eq!(
            settings.validate().unwrap_err().to_string(),
            "roles_header must not be empty when sync_roles is enabled"
        );
    }

    #[test]
    fn encode_writes_nulls_for_unset_fields() {
        let config = encode_settings(&TrustedHeaderSettings::default()).unwrap();
        assert_eq!(config.get("email_header"), Some(&json!(null)));
        assert_eq!(config.str_value("username_header"), Some("Remote-User"));
    }
}
