//! Cluster-wide authenticator settings, keyed by plugin namespace.

use crate::authenticator::{Configuration, Slice};
use crate::config::{read_config_value, write_config_file};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct ClusterConfigStore {
    entries: RwLock<Map<String, Value>>,
    path: Option<PathBuf>,
    /// Serializes writers so snapshots reach the file in write order.
    writer: Mutex<()>,
}

impl ClusterConfigStore {
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(Map::new()),
            path: None,
            writer: Mutex::new(()),
        }
    }

    /// Back the store with a JSON state file, loading it if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            info!("Loading authenticator settings from {}", path.display());
            Configuration::from_value(read_config_value(&path)?)
                .with_context(|| format!("Invalid state file '{}'", path.display()))?
                .as_map()
                .clone()
        } else {
            Map::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
            writer: Mutex::new(()),
        })
    }

    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stored settings of a slice, if any were written.
    pub fn get<T: DeserializeOwned>(&self, slice: Slice) -> Result<Option<T>> {
        let entries = self.entries.read();
        entries
            .get(slice.namespace())
            .map(|value| {
                serde_json::from_value(value.clone())
                    .with_context(|| format!("Stored settings for {slice} are invalid"))
            })
            .transpose()
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, slice: Slice) -> Result<T> {
        Ok(self.get(slice)?.unwrap_or_default())
    }

    /// Store a slice's settings. With a state file, readers see the new
    /// value only after it was persisted; a failed write changes nothing.
    pub async fn write<T: Serialize>(&self, slice: Slice, settings: &T) -> Result<()> {
        let value = serde_json::to_value(settings)?;
        let _writer = self.writer.lock().await;

        let mut next = self.entries.read().clone();
        next.insert(slice.namespace().to_string(), value);

        if let Some(path) = self.path.clone() {
            let snapshot = Value::Object(next.clone());
            let target = path.clone();
            tokio::task::spawn_blocking(move || write_config_file(&target, &snapshot))
                .await
                .context("State file writer stopped")??;
            debug!(slice = %slice, path = %path.display(), "Persisted authenticator settings");
        }

        *self.entries.write() = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::{SsoAuthSettings, TrustedHeaderSettings};
    use tempfile::TempDir;

    #[test]
    fn defaults_until_written() {
        let store = ClusterConfigStore::in_memory();
        let sso: SsoAuthSettings = store.get_or_default(Slice::Sso).unwrap();
        assert_eq!(sso, SsoAuthSettings::default());
        assert!(store.get::<SsoAuthSettings>(Slice::Sso).unwrap().is_none());
    }

    #[tokio::test]
    async fn slices_are_stored_separately() {
        let store = ClusterConfigStore::in_memory();
        let trusted = TrustedHeaderSettings {
            username_header: "X-Forwarded-User".into(),
            ..Default::default()
        };
        store.write(Slice::TrustedHeaders, &trusted).await.unwrap();

        assert_eq!(
            store.get::<TrustedHeaderSettings>(Slice::TrustedHeaders).unwrap(),
            Some(trusted)
        );
        assert!(store.get::<SsoAuthSettings>(Slice::Sso).unwrap().is_none());
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("state").join("settings.json");

        let store = ClusterConfigStore::open(&file).unwrap();
        let sso = SsoAuthSettings {
            sync_roles: true,
            ..Default::default()
        };
        store.write(Slice::Sso, &sso).await.unwrap();

        let reopened = ClusterConfigStore::open(&file).unwrap();
        assert_eq!(reopened.get::<SsoAuthSettings>(Slice::Sso).unwrap(), Some(sso));
        assert_eq!(reopened.path(), Some(file.as_path()));
    }

    #[test]
    fn rejects_non_object_state_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.json");
        std::fs::write(&file, "[1, 2]").unwrap();

        let err = ClusterConfigStore::open(&file).err().unwrap();
        assert!(format!("{err:#}").contains("got an array"));
    }

    #[tokio::test]
    async fn failed_persist_keeps_previous_settings() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("settings.json");
        let store = ClusterConfigStore::open(&file).unwrap();

        let first = TrustedHeaderSettings {
            username_header: "X-First".into(),
            ..Default::default()
        };
        store.write(Slice::TrustedHeaders, &first).await.unwrap();

        // A directory where the state file should be makes the next write fail.
        std::fs::remove_file(&file).unwrap();
        std::fs::create_dir(&file).unwrap();

        let second = TrustedHeaderSettings {
            username_header: "X-Second".into(),
            ..Default::default()
        };
        assert!(store.write(Slice::TrustedHeaders, &second).await.is_err());
        assert_eq!(
            store.get::<TrustedHeaderSettings>(Slice::TrustedHeaders).unwrap(),
            Some(first)
        );

        assert!(store.write(Slice::Sso, &SsoAuthSettings::default()).await.is_err());
        assert!(store.get::<SsoAuthSettings>(Slice::Sso).unwrap().is_none());
    }
}
