use crate::authenticator::Slice;
use crate::client::RoleDirectory;
use crate::editor::ConfigEditor;
use crate::store::ConfigStore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Plugin metadata
// ============================================================================

/// Identity of the backend plugin that owns a slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
    pub unique_id: String,
    pub name: String,
    pub author: String,
    pub url: String,
    pub version: String,
    pub description: String,
    /// Oldest host version the plugin runs on.
    pub required_version: String,
}

impl PluginMetadata {
    pub fn for_slice(slice: Slice) -> Self {
        let (unique_id, name, description) = match slice {
            Slice::Sso => (
                "org.graylog.plugins.auth.sso.SsoAuthPlugin",
                "Single Sign-On (SSO) Authentication Provider",
                "SSO Authentication provider",
            ),
            Slice::TrustedHeaders => (
                "org.graylog.plugins.auth.httpheaders.HttpHeadersAuthPlugin",
                "Trusted HTTP Headers Authentication Provider",
                "Authentication provider based on trusted HTTP headers (SSO)",
            ),
        };
        Self {
            unique_id: unique_id.to_string(),
            name: name.to_string(),
            author: "Graylog, Inc".to_string(),
            url: "https://www.graylog.org/".to_string(),
            version: "1.0.0".to_string(),
            description: description.to_string(),
            required_version: "2.1.0-SNAPSHOT".to_string(),
        }
    }
}

// ============================================================================
// Authenticator panels
// ============================================================================

/// Registry entry for one authenticator configuration panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorPanel {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub can_be_disabled: bool,
    pub slice: Slice,
    pub metadata: PluginMetadata,
}

impl AuthenticatorPanel {
    pub fn for_slice(slice: Slice) -> Self {
        let (display_name, description) = match slice {
            Slice::Sso => (
                "Single Sign-On (SSO)",
                "Creates and authenticates users based on HTTP headers set by an authentication proxy to integrate with SSO systems",
            ),
            Slice::TrustedHeaders => (
                "Trusted HTTP Headers",
                "Authenticates users based on HTTP headers set by a trusted proxy",
            ),
        };
        Self {
            name: slice.name().to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            can_be_disabled: true,
            slice,
            metadata: PluginMetadata::for_slice(slice),
        }
    }

    /// The editor view behind this panel.
    pub fn create_editor(
        &self,
        store: Arc<ConfigStore>,
        roles: Option<Arc<dyn RoleDirectory>>,
    ) -> ConfigEditor {
        ConfigEditor::new(store, roles)
    }
}

/// Authenticator panels known to the host, in registration order.
#[derive(Debug, Clone, Default)]
pub struct PanelRegistry {
    panels: Vec<AuthenticatorPanel>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the SSO and trusted headers panels.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for slice in Slice::ALL {
            registry.register(AuthenticatorPanel::for_slice(slice));
        }
        registry
    }

    /// Add a panel. A panel with the same name replaces the earlier one in place.
    pub fn register(&mut self, panel: AuthenticatorPanel) {
        if let Some(existing) = self.panels.iter_mut().find(|p| p.name == panel.name) {
            warn!(panel = %panel.name, "Replacing registered authenticator panel");
            *existing = panel;
            return;
        }
        info!(panel = %panel.name, "Registered authenticator panel");
        self.panels.push(panel);
    }

    pub fn get(&self, name: &str) -> Option<&AuthenticatorPanel> {
        self.panels.iter().find(|p| p.name == name)
    }

    pub fn find_by_slice(&self, slice: Slice) -> Option<&AuthenticatorPanel> {
        self.panels.iter().find(|p| p.slice == slice)
    }

    pub fn list(&self) -> &[AuthenticatorPanel] {
        &self.panels
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
