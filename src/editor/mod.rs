//! Configuration editor view model.
//!
//! The editor keeps its own working copy of the configuration. Field changes
//! replace that copy with an edited clone; the store's value only changes
//! after a save round-trip, at which point the backend's answer replaces the
//! working copy as well.
//!
//! ```text
//! Uninitialized --mount--> Loading --ok--> Ready --submit--> Saving --ok/err--> Ready
//!                             \--err--> Uninitialized
//! ```
//!
//! A mount that finds another load or save in flight starts from the store's
//! held value, or keeps loading until that operation publishes.

mod form;

pub use form::*;

use crate::authenticator::{Configuration, FieldChange, Slice};
use crate::client::RoleDirectory;
use crate::store::{ConfigStore, ConfigUpdate, StoreError, SubscriptionId};

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Uninitialized,
    Loading,
    Ready,
    Saving,
}

impl std::fmt::Display for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Saving => "saving",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("the {0} editor needs a role directory")]
    MissingRoleDirectory(Slice),
    #[error("the editor is not mounted")]
    NotMounted,
    #[error("the editor is not ready for edits (state: {0})")]
    NotReady(EditorState),
    #[error("unknown field '{field}' in the {slice} form")]
    UnknownField { slice: Slice, field: String },
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

struct ViewState {
    state: EditorState,
    working: Option<Configuration>,
    roles: Option<Vec<String>>,
    mounted: bool,
}

impl ViewState {
    fn unmounted() -> Self {
        Self {
            state: EditorState::Uninitialized,
            working: None,
            roles: None,
            mounted: false,
        }
    }
}

pub struct ConfigEditor {
    slice: Slice,
    store: Arc<ConfigStore>,
    roles: Option<Arc<dyn RoleDirectory>>,
    view: Arc<Mutex<ViewState>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl ConfigEditor {
    pub fn new(store: Arc<ConfigStore>, roles: Option<Arc<dyn RoleDirectory>>) -> Self {
        Self {
            slice: store.slice(),
            store,
            roles,
            view: Arc::new(Mutex::new(ViewState::unmounted())),
            subscription: Mutex::new(None),
        }
    }

    pub fn slice(&self) -> Slice {
        self.slice
    }

    pub fn state(&self) -> EditorState {
        self.view.lock().state
    }

    pub fn is_mounted(&self) -> bool {
        self.view.lock().mounted
    }

    /// The locally edited configuration.
    pub fn working_copy(&self) -> Option<Configuration> {
        self.view.lock().working.clone()
    }

    pub fn roles(&self) -> Option<Vec<String>> {
        self.view.lock().roles.clone()
    }

    /// Subscribe to the store, then load the configuration and, where the
    /// form needs them, the role names.
    ///
    /// Mounting an already mounted editor does nothing.
    pub async fn mount(&self) -> Result<(), EditorError> {
        if self.slice.requires_role_directory() && self.roles.is_none() {
            return Err(EditorError::MissingRoleDirectory(self.slice));
        }

        {
            let mut view = self.view.lock();
            if view.mounted {
                return Ok(());
            }
            view.mounted = true;
            view.state = EditorState::Loading;
        }

        let weak = Arc::downgrade(&self.view);
        let id = self.store.subscribe(Arc::new(move |update: &ConfigUpdate| {
            let Some(view) = weak.upgrade() else {
                return;
            };
            let mut view = view.lock();
            if !view.mounted {
                return;
            }
            view.working = Some(update.config.clone());
            if matches!(view.state, EditorState::Loading | EditorState::Uninitialized) {
                view.state = EditorState::Ready;
            }
        }));
        *self.subscription.lock() = Some(id);

        debug!(slice = %self.slice, "Editor mounted");
        let (loaded, ()) = tokio::join!(self.store.load(), self.load_roles());
        let held = match &loaded {
            Err(StoreError::Busy { .. }) => self.store.current(),
            _ => None,
        };

        let mut view = self.view.lock();
        let loading = view.mounted && view.state == EditorState::Loading;
        match loaded {
            Ok(_) => {
                if loading {
                    view.state = EditorState::Ready;
                }
                Ok(())
            }
            Err(StoreError::Busy { in_flight, .. }) => {
                debug!(slice = %self.slice, %in_flight, "Mounted while the store is busy");
                if let (true, Some(held)) = (loading, held) {
                    view.working = Some(held);
                    view.state = EditorState::Ready;
                }
                Ok(())
            }
            Err(e) => {
                if loading {
                    view.state = EditorState::Uninitialized;
                }
                Err(e.into())
            }
        }
    }

    async fn load_roles(&self) {
        if !self.slice.requires_role_directory() {
            return;
        }
        let Some(directory) = self.roles.as_ref() else {
            return;
        };
        match directory.role_names().await {
            Ok(names) => {
                let mut view = self.view.lock();
                if view.mounted {
                    view.roles = Some(names);
                }
            }
            Err(e) => warn!(slice = %self.slice, error = %e, "Could not load role names"),
        }
    }

    /// Stop listening to the store and discard the working copy. Results of
    /// operations still in flight are ignored.
    pub fn unmount(&self) {
        *self.view.lock() = ViewState::unmounted();
        if let Some(id) = self.subscription.lock().take() {
            self.store.unsubscribe(id);
            debug!(slice = %self.slice, "Editor unmounted");
        }
    }

    /// Replace exactly one field of the working copy.
    ///
    /// The change must match the field's input: checkboxes take
    /// [`FieldChange::Checked`], text inputs and selects take
    /// [`FieldChange::Text`], and a select only accepts one of its options.
    pub fn change(&self, change: FieldChange) -> Result<Configuration, EditorError> {
        let Some(spec) = field_spec(self.slice, change.name()) else {
            return Err(EditorError::UnknownField {
                slice: self.slice,
                field: change.name().to_string(),
            });
        };

        let mut view = self.view.lock();
        if !view.mounted {
            return Err(EditorError::NotMounted);
        }
        let state = view.state;
        if state != EditorState::Ready || view.working.is_none() {
            return Err(EditorError::NotReady(state));
        }
        self.check_change(spec, &change, view.roles.as_deref())?;

        let Some(working) = view.working.as_ref() else {
            return Err(EditorError::NotReady(state));
        };
        let next = working.apply(&change);
        view.working = Some(next.clone());
        Ok(next)
    }

    fn check_change(
        &self,
        spec: &FieldSpec,
        change: &FieldChange,
        roles: Option<&[String]>,
    ) -> Result<(), EditorError> {
        let invalid = |reason: String| EditorError::InvalidValue {
            field: spec.name.to_string(),
            reason,
        };
        match (spec.input, change) {
            (InputKind::Checkbox, FieldChange::Checked { .. }) => Ok(()),
            (InputKind::Checkbox, FieldChange::Text { .. }) => {
                Err(invalid("expects a checked state, not text".into()))
            }
            (InputKind::Text | InputKind::Select, FieldChange::Checked { .. }) => {
                Err(invalid("expects text, not a checked state".into()))
            }
            (InputKind::Text, FieldChange::Text { .. }) => Ok(()),
            (InputKind::Select, FieldChange::Text { value, .. }) => {
                let options = default_group_options(self.slice, roles.unwrap_or_default());
                if options.iter().any(|o| o.value == *value) {
                    return Ok(());
                }
                let choices: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
                Err(invalid(format!(
                    "'{value}' is not one of [{}]",
                    choices.join(", ")
                )))
            }
        }
    }

    /// Text input or select changed.
    pub fn set_text(&self, name: &str, value: &str) -> Result<Configuration, EditorError> {
        self.change(FieldChange::text(name, value))
    }

    /// Checkbox changed. `checked` overrides the input's own state when given.
    pub fn set_checked(
        &self,
        name: &str,
        checked: Option<bool>,
        native_checked: bool,
    ) -> Result<Configuration, EditorError> {
        self.change(FieldChange::checked(name, checked, native_checked))
    }

    /// Send the whole working copy to the store.
    ///
    /// On success the backend's answer is the new working copy; on failure
    /// the local edits are kept.
    pub async fn submit(&self) -> Result<Configuration, EditorError> {
        let candidate = {
            let mut view = self.view.lock();
            if !view.mounted {
                return Err(EditorError::NotMounted);
            }
            let state = view.state;
            let candidate = match (state, view.working.clone()) {
                (EditorState::Ready, Some(candidate)) => candidate,
                _ => return Err(EditorError::NotReady(state)),
            };
            view.state = EditorState::Saving;
            candidate
        };

        let result = self.store.save(candidate).await;

        {
            let mut view = self.view.lock();
            if view.mounted {
                view.state = EditorState::Ready;
            }
        }
        Ok(result?)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        let view = self.view.lock();
        match view.working.as_ref() {
            Some(config) => is_field_disabled(self.slice, config, name),
            None => true,
        }
    }

    /// True until both the configuration and, where needed, the role names
    /// are available.
    pub fn is_loading(&self) -> bool {
        let view = self.view.lock();
        view.working.is_none() || (self.slice.requires_role_directory() && view.roles.is_none())
    }

    pub fn render(&self) -> EditorView {
        let view = self.view.lock();
        let roles: Option<&[String]> = if self.slice.requires_role_directory() {
            view.roles.as_deref()
        } else {
            Some(&[])
        };
        match (view.working.as_ref(), roles) {
            (Some(config), Some(roles)) => EditorView::Form(render_form(self.slice, config, roles)),
            _ => EditorView::loading(self.slice),
        }
    }
}

impl Drop for ConfigEditor {
    fn drop(&mut self) {
        self.unmount();
    }
}
