use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known configuration keys.
pub mod fields {
    pub const USERNAME_HEADER: &str = "username_header";
    pub const FULLNAME_HEADER: &str = "fullname_header";
    pub const EMAIL_HEADER: &str = "email_header";
    pub const DEFAULT_EMAIL_DOMAIN: &str = "default_email_domain";
    pub const DEFAULT_GROUP: &str = "default_group";
    pub const AUTO_CREATE_USER: &str = "auto_create_user";
    pub const REQUIRE_TRUSTED_PROXIES: &str = "require_trusted_proxies";
    pub const TRUSTED_PROXIES: &str = "trusted_proxies";
    pub const SYNC_ROLES: &str = "sync_roles";
    pub const ROLES_HEADER: &str = "roles_header";
}

/// An authenticator configuration as exchanged with the backend.
///
/// The payload is opaque: keys the client does not know about are carried
/// through untouched, and every edit produces a new value instead of
/// mutating the existing one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

#[derive(Debug, thiserror::Error)]
#[error("configuration must be a JSON object, got {0}")]
pub struct NotAnObject(&'static str);

impl Configuration {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn from_value(value: Value) -> Result<Self, NotAnObject> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(NotAnObject("null")),
            Value::Bool(_) => Err(NotAnObject("a boolean")),
            Value::Number(_) => Err(NotAnObject("a number")),
            Value::String(_) => Err(NotAnObject("a string")),
            Value::Array(_) => Err(NotAnObject("an array")),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a key; `None` for missing, null or non-string values.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Boolean value of a key; anything but `true` counts as unset.
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy of this configuration with exactly one key replaced.
    pub fn with_field(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut copy = self.0.clone();
        copy.insert(key.to_string(), value.into());
        Self(copy)
    }

    /// A copy of this configuration with `change` applied.
    pub fn apply(&self, change: &FieldChange) -> Self {
        self.with_field(change.name(), change.value())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Configuration {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A single form edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// A text input or select changed.
    Text { name: String, value: String },
    /// A checkbox changed. An explicit `checked` wins over the input's own
    /// checked state.
    Checked {
        name: String,
        checked: Option<bool>,
        native_checked: bool,
    },
}

impl FieldChange {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn checked(name: impl Into<String>, checked: Option<bool>, native_checked: bool) -> Self {
        Self::Checked {
            name: name.into(),
            checked,
            native_checked,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::Checked { name, .. } => name,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Self::Text { value, .. } => Value::String(value.clone()),
            Self::Checked {
                checked,
                native_checked,
                ..
            } => Value::Bool(checked.unwrap_or(*native_checked)),
        }
    }
}
