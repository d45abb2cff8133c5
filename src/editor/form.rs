//! Framework-independent description of the configuration forms.

use crate::authenticator::{fields, Configuration, Slice};
use crate::config::{DEFAULT_EMAIL_DOMAIN, DEFAULT_GROUP};

use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Checkbox,
    Select,
}

/// Static description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub legend: &'static str,
    pub label: &'static str,
    pub help: &'static str,
    pub placeholder: Option<&'static str>,
    pub input: InputKind,
    pub required: bool,
    /// Boolean field that must be set for this field to be editable.
    pub governed_by: Option<&'static str>,
}

const HEADER_CONFIGURATION: &str = "Header configuration";
const SECURITY: &str = "Security";
const USER_CREATION: &str = "User creation";
const ROLE_SYNCHRONIZATION: &str = "Role synchronization";

const USERNAME_HEADER: FieldSpec = FieldSpec {
    name: fields::USERNAME_HEADER,
    legend: HEADER_CONFIGURATION,
    label: "Username Header",
    help: "HTTP header containing the implicitly trusted name of the user",
    placeholder: Some("Remote-User"),
    input: InputKind::Text,
    required: true,
    governed_by: None,
};

const REQUIRE_TRUSTED_PROXIES: FieldSpec = FieldSpec {
    name: fields::REQUIRE_TRUSTED_PROXIES,
    legend: SECURITY,
    label: "Request must come from a trusted proxy",
    help: "Enable this to require the request containing the SSO header as directly coming \
           from a trusted proxy. This is highly recommended to avoid header injection.",
    placeholder: None,
    input: InputKind::Checkbox,
    required: false,
    governed_by: None,
};

const AUTO_CREATE_USER: FieldSpec = FieldSpec {
    name: fields::AUTO_CREATE_USER,
    legend: USER_CREATION,
    label: "Automatically create users",
    help: "Enable this to automatically create a user account for externally authenticated \
           users. If disabled, an administrator needs to manually create a user account.",
    placeholder: None,
    input: InputKind::Checkbox,
    required: false,
    governed_by: None,
};

const FULLNAME_HEADER: FieldSpec = FieldSpec {
    name: fields::FULLNAME_HEADER,
    legend: USER_CREATION,
    label: "Full Name Header",
    help: "HTTP header containing the full name of user to create (defaults to the user name).",
    placeholder: Some("Fullname header"),
    input: InputKind::Text,
    required: false,
    governed_by: Some(fields::AUTO_CREATE_USER),
};

const EMAIL_HEADER: FieldSpec = FieldSpec {
    name: fields::EMAIL_HEADER,
    legend: USER_CREATION,
    label: "Email Header",
    help: "HTTP header containing the email address of user to create",
    placeholder: Some("Email header"),
    input: InputKind::Text,
    required: false,
    governed_by: Some(fields::AUTO_CREATE_USER),
};

const DEFAULT_EMAIL_DOMAIN_FIELD: FieldSpec = FieldSpec {
    name: fields::DEFAULT_EMAIL_DOMAIN,
    legend: USER_CREATION,
    label: "Email Domain",
    help: "The default domain to use if there is no email header configured (defaults to 'localhost').",
    placeholder: Some("localhost"),
    input: InputKind::Text,
    required: false,
    governed_by: Some(fields::AUTO_CREATE_USER),
};

const DEFAULT_GROUP_FIELD: FieldSpec = FieldSpec {
    name: fields::DEFAULT_GROUP,
    legend: USER_CREATION,
    label: "Default User Role",
    help: "The default role determines whether a user created can access the entire system, \
           or has limited access.",
    placeholder: None,
    input: InputKind::Select,
    required: true,
    governed_by: Some(fields::AUTO_CREATE_USER),
};

const SYNC_ROLES: FieldSpec = FieldSpec {
    name: fields::SYNC_ROLES,
    legend: ROLE_SYNCHRONIZATION,
    label: "Synchronize the roles of the user from the specified HTTP header",
    help: "Enable this to automatically synchronize the roles of the user with those specified \
           in the HTTP header. Only existing roles will be added to the user.",
    placeholder: None,
    input: InputKind::Checkbox,
    required: false,
    governed_by: None,
};

const ROLES_HEADER: FieldSpec = FieldSpec {
    name: fields::ROLES_HEADER,
    legend: ROLE_SYNCHRONIZATION,
    label: "Roles Header",
    help: "Prefix of the HTTP header, can contain a comma-separated list of roles in one header, \
           otherwise all headers with that prefix will be recognized.",
    placeholder: Some("Roles header"),
    input: InputKind::Text,
    required: false,
    governed_by: Some(fields::SYNC_ROLES),
};

const SSO_FIELDS: &[FieldSpec] = &[
    USERNAME_HEADER,
    REQUIRE_TRUSTED_PROXIES,
    AUTO_CREATE_USER,
    FULLNAME_HEADER,
    EMAIL_HEADER,
    DEFAULT_EMAIL_DOMAIN_FIELD,
    DEFAULT_GROUP_FIELD,
    SYNC_ROLES,
    ROLES_HEADER,
];

const TRUSTED_HEADERS_FIELDS: &[FieldSpec] = &[
    USERNAME_HEADER,
    AUTO_CREATE_USER,
    FULLNAME_HEADER,
    EMAIL_HEADER,
    DEFAULT_GROUP_FIELD,
];

/// Fixed role choices of the trusted headers form.
const TRUSTED_HEADERS_ROLES: &[(&str, &str)] = &[
    ("Reader", "Reader - basic access"),
    ("Admin", "Administrator - complete access"),
];

/// Field specs of a slice, in display order.
pub fn field_specs(slice: Slice) -> &'static [FieldSpec] {
    match slice {
        Slice::Sso => SSO_FIELDS,
        Slice::TrustedHeaders => TRUSTED_HEADERS_FIELDS,
    }
}

pub fn field_spec(slice: Slice, name: &str) -> Option<&'static FieldSpec> {
    field_specs(slice).iter().find(|spec| spec.name == name)
}

/// Choices of the default group select. SSO offers the role directory's
/// names, the trusted headers form a fixed pair.
pub fn default_group_options(slice: Slice, roles: &[String]) -> Vec<SelectOption> {
    match slice {
        Slice::Sso => roles
            .iter()
            .map(|r| SelectOption {
                value: r.clone(),
                label: r.clone(),
            })
            .collect(),
        Slice::TrustedHeaders => TRUSTED_HEADERS_ROLES
            .iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect(),
    }
}

/// Whether a field is rendered non-interactive. Presentation only: the
/// field's value stays in the working copy.
pub fn is_field_disabled(slice: Slice, config: &Configuration, name: &str) -> bool {
    field_spec(slice, name)
        .and_then(|spec| spec.governed_by)
        .map(|governor| !config.flag(governor))
        .unwrap_or(false)
}

// ============================================================================
// Rendered View
// ============================================================================

/// What the editor shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EditorView {
    Loading {
        title: String,
        description: String,
    },
    Form(FormView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub fieldsets: Vec<Fieldset>,
    pub submit_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fieldset {
    pub legend: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub help: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub input: InputKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    pub value: Value,
    pub required: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fieldsets
            .iter()
            .flat_map(|fs| fs.fields.iter())
            .find(|f| f.name == name)
    }
}

impl EditorView {
    pub fn loading(slice: Slice) -> Self {
        let messages = slice.messages();
        Self::Loading {
            title: messages.page_title.to_string(),
            description: messages.page_description.to_string(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn form(&self) -> Option<&FormView> {
        match self {
            Self::Form(form) => Some(form),
            Self::Loading { .. } => None,
        }
    }
}

/// Build the form of `slice` for the given working copy.
pub fn render_form(slice: Slice, config: &Configuration, roles: &[String]) -> FormView {
    let messages = slice.messages();
    let mut fieldsets: Vec<Fieldset> = Vec::new();

    for spec in field_specs(slice) {
        let field = render_field(slice, spec, config, roles);
        match fieldsets.last_mut() {
            Some(fs) if fs.legend == spec.legend => fs.fields.push(field),
            _ => fieldsets.push(Fieldset {
                legend: spec.legend.to_string(),
                fields: vec![field],
            }),
        }
    }

    FormView {
        id: messages.form_id.to_string(),
        title: messages.page_title.to_string(),
        description: messages.page_description.to_string(),
        fieldsets,
        submit_label: messages.submit_label.to_string(),
    }
}

fn render_field(slice: Slice, spec: &FieldSpec, config: &Configuration, roles: &[String]) -> FormField {
    let mut help = spec.help.to_string();
    let mut warning = None;
    let mut value = config.get(spec.name).cloned().unwrap_or(Value::Null);
    let mut options = Vec::new();

    match spec.name {
        fields::REQUIRE_TRUSTED_PROXIES => {
            match config
                .str_value(fields::TRUSTED_PROXIES)
                .filter(|p| !p.trim().is_empty())
            {
                Some(proxies) => help.push_str(&format!(
                    " The current subnet setting is: {proxies}. You can configure the setting \
                     in the server configuration file."
                )),
                None => {
                    warning = Some(
                        "There are no trusted proxies set! Please configure the trusted_proxies \
                         setting in the server configuration file."
                            .to_string(),
                    )
                }
            }
        }
        fields::EMAIL_HEADER => {
            let domain = match slice {
                Slice::Sso => config
                    .str_value(fields::DEFAULT_EMAIL_DOMAIN)
                    .filter(|d| !d.is_empty())
                    .unwrap_or(DEFAULT_EMAIL_DOMAIN),
                Slice::TrustedHeaders => DEFAULT_EMAIL_DOMAIN,
            };
            help.push_str(&format!(" (defaults to 'username@{domain}')."));
        }
        fields::DEFAULT_GROUP => {
            options = default_group_options(slice, roles);
            if slice == Slice::Sso && !value.is_string() {
                value = Value::String(DEFAULT_GROUP.to_string());
            }
        }
        _ => {}
    }

    FormField {
        name: spec.name.to_string(),
        label: spec.label.to_string(),
        help,
        placeholder: spec.placeholder.map(String::from),
        input: spec.input,
        options,
        value,
        required: spec.required,
        disabled: is_field_disabled(slice, config, spec.name),
        warning,
    }
}

// ============================================================================
// Text Rendering
// ============================================================================

impl fmt::Display for FormView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.description)?;
        for fieldset in &self.fieldsets {
            writeln!(f)?;
            writeln!(f, "[{}]", fieldset.legend)?;
            for field in &fieldset.fields {
                let value = match &field.value {
                    Value::Null => "-".to_string(),
                    Value::String(s) if s.is_empty() => "-".to_string(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let mut flags = Vec::new();
                if field.required {
                    flags.push("required");
                }
                if field.disabled {
                    flags.push("disabled");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", flags.join(", "))
                };
                writeln!(f, "  {:<24} {}{}", field.name, value, flags)?;
                if !field.options.is_empty() {
                    let options: Vec<&str> = field.options.iter().map(|o| o.value.as_str()).collect();
                    writeln!(f, "  {:<24} options: {}", "", options.join(", "))?;
                }
                if let Some(warning) = &field.warning {
                    writeln!(f, "  {:<24} ! {}", "", warning)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for EditorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading { title, .. } => writeln!(f, "{title}\n  loading..."),
            Self::Form(form) => fmt::Display::fmt(form, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> Configuration {
        Configuration::from_value(value).unwrap()
    }

    fn roles() -> Vec<String> {
        vec!["Admin".into(), "Reader".into(), "Auditor".into()]
    }

    #[test]
    fn sso_fieldsets_in_order() {
        let form = render_form(Slice::Sso, &config(json!({})), &roles());
        let legends: Vec<&str> = form.fieldsets.iter().map(|f| f.legend.as_str()).collect();
        assert_eq!(
            legends,
            vec![
                "Header configuration",
                "Security",
                "User creation",
                "Role synchronization"
            ]
        );
        assert_eq!(form.submit_label, "Save SSO settings");
    }

    #[test]
    fn trusted_headers_has_no_sso_only_fields() {
        let form = render_form(Slice::TrustedHeaders, &config(json!({})), &[]);
        assert!(form.field(fields::SYNC_ROLES).is_none());
        assert!(form.field(fields::REQUIRE_TRUSTED_PROXIES).is_none());
        assert!(form.field(fields::DEFAULT_EMAIL_DOMAIN).is_none());

        let group = form.field(fields::DEFAULT_GROUP).unwrap();
        let values: Vec<&str> = group.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["Reader", "Admin"]);
    }

    #[test]
    fn governed_fields_disabled_but_keep_values() {
        let cfg = config(json!({
            "auto_create_user": false,
            "email_header": "X-Email",
            "sync_roles": false,
            "roles_header": "Roles"
        }));
        let form = render_form(Slice::Sso, &cfg, &roles());

        let email = form.field(fields::EMAIL_HEADER).unwrap();
        assert!(email.disabled);
        assert_eq!(email.value, json!("X-Email"));
        assert!(form.field(fields::ROLES_HEADER).unwrap().disabled);
        assert!(!form.field(fields::USERNAME_HEADER).unwrap().disabled);
    }

    #[test]
    fn missing_trusted_proxies_produce_warning() {
        let form = render_form(Slice::Sso, &config(json!({})), &roles());
        let field = form.field(fields::REQUIRE_TRUSTED_PROXIES).unwrap();
        assert!(field.warning.as_deref().unwrap().contains("no trusted proxies"));

        let form = render_form(
            Slice::Sso,
            &config(json!({"trusted_proxies": "10.0.0.0/8"})),
            &roles(),
        );
        let field = form.field(fields::REQUIRE_TRUSTED_PROXIES).unwrap();
        assert!(field.warning.is_none());
        assert!(field.help.contains("The current subnet setting is: 10.0.0.0/8"));
    }

    #[test]
    fn email_help_mentions_default_domain() {
        let form = render_form(
            Slice::Sso,
            &config(json!({"default_email_domain": "example.org"})),
            &roles(),
        );
        assert!(form
            .field(fields::EMAIL_HEADER)
            .unwrap()
            .help
            .ends_with("(defaults to 'username@example.org')."));
    }

    #[test]
    fn sso_role_selector_defaults_to_reader() {
        let form = render_form(Slice::Sso, &config(json!({"default_group": null})), &roles());
        let group = form.field(fields::DEFAULT_GROUP).unwrap();
        assert_eq!(group.value, json!("Reader"));
        assert_eq!(group.options.len(), 3);
    }

    #[test]
    fn text_rendering_marks_flags() {
        let form = render_form(
            Slice::TrustedHeaders,
            &config(json!({"username_header": "Remote-User", "auto_create_user": false})),
            &[],
        );
        let text = form.to_string();
        assert!(text.contains("username_header"));
        assert!(text.contains("Remote-User (required)"));
        assert!(text.contains("(required, disabled)"));
    }
}
