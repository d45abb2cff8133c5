use crate::authenticator::{FieldChange, Slice};
use crate::client::{ApiTransport, HttpConfigClient, HttpRoleDirectory, RoleDirectory};
use crate::config::ClientConfig;
use crate::editor::{field_spec, ConfigEditor, InputKind};
use crate::plugins::PanelRegistry;
use crate::store::{ConfigStore, NotificationLevel, NotificationLog};

use anyhow::{Context, Result};
use std::sync::Arc;

/// An editor wired to the HTTP backend, with notifications collected for printing.
pub struct EditorSession {
    pub editor: ConfigEditor,
    pub notifications: Arc<NotificationLog>,
}

impl EditorSession {
    pub fn open(client: &ClientConfig, slice: Slice) -> Result<Self> {
        let registry = PanelRegistry::with_builtin();
        let panel = registry
            .find_by_slice(slice)
            .with_context(|| format!("No panel registered for {slice}"))?;

        let transport = ApiTransport::from_config(client)?;
        let api = HttpConfigClient::new(transport.clone(), slice)?;
        let roles: Option<Arc<dyn RoleDirectory>> = if slice.requires_role_directory() {
            Some(Arc::new(HttpRoleDirectory::new(transport)))
        } else {
            None
        };

        let notifications = Arc::new(NotificationLog::new());
        let store = Arc::new(ConfigStore::new(slice, Arc::new(api), notifications.clone()));

        Ok(Self {
            editor: panel.create_editor(store, roles),
            notifications,
        })
    }

    /// Print and clear pending notifications.
    pub fn flush_notifications(&self) {
        for note in self.notifications.drain() {
            match (note.level, note.title) {
                (NotificationLevel::Success, _) => println!("{}", note.message),
                (NotificationLevel::Error, Some(title)) => eprintln!("{}: {}", title, note.message),
                (NotificationLevel::Error, None) => eprintln!("{}", note.message),
            }
        }
    }
}

/// Mount an editor and print the rendered form.
pub async fn show(client: &ClientConfig, slice: Slice, json: bool) -> Result<()> {
    let session = EditorSession::open(client, slice)?;
    let mounted = session.editor.mount().await;
    session.flush_notifications();
    mounted?;

    let view = session.editor.render();
    if view.is_loading() {
        anyhow::bail!("The {slice} form could not be rendered: role names are unavailable");
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{view}");
    }
    Ok(())
}

/// Mount an editor, apply `assignments` to the working copy and submit it.
pub async fn set(client: &ClientConfig, slice: Slice, assignments: &[String]) -> Result<()> {
    let changes = assignments
        .iter()
        .map(|a| parse_assignment(slice, a))
        .collect::<Result<Vec<_>>>()?;

    let session = EditorSession::open(client, slice)?;
    let mounted = session.editor.mount().await;
    session.flush_notifications();
    mounted?;

    for change in changes {
        session.editor.change(change)?;
    }

    let saved = session.editor.submit().await;
    session.flush_notifications();
    let saved = saved?;
    println!("{}", serde_json::to_string_pretty(&saved)?);
    Ok(())
}

/// Print the registered panels.
pub fn panels(json: bool) -> Result<()> {
    let registry = PanelRegistry::with_builtin();
    if json {
        println!("{}", serde_json::to_string_pretty(registry.list())?);
        return Ok(());
    }
    for panel in registry.list() {
        println!("{:<16} {}", panel.name, panel.display_name);
        println!("{:<16} {}", "", panel.description);
        println!("{:<16} {}", "", panel.slice.config_path());
    }
    Ok(())
}

/// Turn `field=value` into a field change. Checkbox fields take a boolean.
pub fn parse_assignment(slice: Slice, assignment: &str) -> Result<FieldChange> {
    let (name, value) = assignment
        .split_once('=')
        .with_context(|| format!("Expected FIELD=VALUE, got '{assignment}'"))?;
    let name = name.trim();

    match field_spec(slice, name).map(|spec| spec.input) {
        Some(InputKind::Checkbox) => {
            let checked = parse_bool(value)
                .with_context(|| format!("'{name}' expects true or false, got '{value}'"))?;
            Ok(FieldChange::checked(name, Some(checked), checked))
        }
        _ => Ok(FieldChange::text(name, value)),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
