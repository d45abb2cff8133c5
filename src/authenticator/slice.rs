use serde::{Deserialize, Serialize};

/// One authenticator type together with everything needed to talk to its
/// backend and present it to an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slice {
    /// Single Sign-On header authentication.
    Sso,
    /// Generic trusted HTTP headers authentication.
    TrustedHeaders,
}

/// User-facing texts of a slice.
#[derive(Debug, Clone, Copy)]
pub struct SliceMessages {
    pub page_title: &'static str,
    pub page_description: &'static str,
    pub form_id: &'static str,
    pub submit_label: &'static str,
    pub fetch_failed: &'static str,
    pub fetch_failed_title: &'static str,
    pub save_failed: &'static str,
    pub save_failed_title: &'static str,
    pub save_succeeded: &'static str,
}

/// Permissions guarding the config endpoints of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlicePermissions {
    pub read: &'static str,
    pub update: &'static str,
}

const SSO_MESSAGES: SliceMessages = SliceMessages {
    page_title: "Single Sign-On Configuration",
    page_description: "Configuration page for the SSO authenticator.",
    form_id: "sso-config-form",
    submit_label: "Save SSO settings",
    fetch_failed: "Fetching config failed",
    fetch_failed_title: "Could not retrieve SSO authenticator config",
    save_failed: "Updating SSO config failed",
    save_failed_title: "Unable to update SSO authenticator config",
    save_succeeded: "SSO configuration was updated successfully",
};

const TRUSTED_HEADERS_MESSAGES: SliceMessages = SliceMessages {
    page_title: "Trusted HTTP headers (SSO)",
    page_description: "Configuration page for the trusted HTTP headers authenticator.",
    form_id: "trusted-headers-form",
    submit_label: "Save authenticator settings",
    fetch_failed: "Fetching config failed",
    fetch_failed_title: "Could not retrieve trusted HTTP headers authenticator config",
    save_failed: "Updating authenticator config failed",
    save_failed_title: "Unable to update trusted HTTP headers authenticator config",
    save_succeeded: "trusted HTTP headers authenticator configuration was updated successfully",
};

impl Slice {
    pub const ALL: [Slice; 2] = [Slice::Sso, Slice::TrustedHeaders];

    /// Registry name of the slice.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sso => "sso",
            Self::TrustedHeaders => "trusted-headers",
        }
    }

    /// Plugin namespace the REST resources are mounted under.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Sso => "org.graylog.plugins.auth.sso",
            Self::TrustedHeaders => "org.graylog.plugins.auth.httpheaders",
        }
    }

    pub fn base_path(&self) -> String {
        format!("/plugins/{}", self.namespace())
    }

    pub fn config_path(&self) -> String {
        format!("{}/config", self.base_path())
    }

    pub fn messages(&self) -> &'static SliceMessages {
        match self {
            Self::Sso => &SSO_MESSAGES,
            Self::TrustedHeaders => &TRUSTED_HEADERS_MESSAGES,
        }
    }

    pub fn permissions(&self) -> SlicePermissions {
        match self {
            Self::Sso => SlicePermissions {
                read: "ssoauthconfig:read",
                update: "ssoauthconfig:edit",
            },
            Self::TrustedHeaders => SlicePermissions {
                read: "trustedheaderauthconfig:read",
                update: "trustedheaderauthconfig:edit",
            },
        }
    }

    /// Audit event type recorded when the configuration is updated.
    pub fn audit_event_type(&self) -> &'static str {
        match self {
            Self::Sso => "sso_auth:config:update",
            Self::TrustedHeaders => "trusted_header_auth:config:update",
        }
    }

    /// Whether the editor needs the role directory before it can render.
    pub fn requires_role_directory(&self) -> bool {
        matches!(self, Self::Sso)
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Slice {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sso" => Ok(Self::Sso),
            "trusted-headers" | "trusted_headers" | "httpheaders" => Ok(Self::TrustedHeaders),
            other => Err(format!(
                "unknown authenticator '{other}' (expected 'sso' or 'trusted-headers')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_paths_are_namespaced() {
        assert_eq!(
            Slice::Sso.config_path(),
            "/plugins/org.graylog.plugins.auth.sso/config"
        );
        assert_eq!(
            Slice::TrustedHeaders.config_path(),
            "/plugins/org.graylog.plugins.auth.httpheaders/config"
        );
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("SSO".parse::<Slice>().unwrap(), Slice::Sso);
        assert_eq!("httpheaders".parse::<Slice>().unwrap(), Slice::TrustedHeaders);
        assert!("ldap".parse::<Slice>().is_err());
    }

    #[test]
    fn only_sso_needs_roles() {
        assert!(Slice::Sso.requires_role_directory());
        assert!(!Slice::TrustedHeaders.requires_role_directory());
    }

    #[test]
    fn serde_uses_registry_names() {
        let json = serde_json::to_value(Slice::TrustedHeaders).unwrap();
        assert_eq!(json, "trusted-headers");
    }
}
