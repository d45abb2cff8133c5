/// Default configuration constants used across the system.

/// Default port of the reference backend.
pub const DEFAULT_PORT: u16 = 9000;

/// Role names served when none are configured.
pub const DEFAULT_ROLES: &[&str] = &["Admin", "Reader"];

/// Role assigned to auto-created users when no default group is set.
pub const DEFAULT_GROUP: &str = "Reader";

/// Username header used by both authenticators out of the box.
pub const DEFAULT_USERNAME_HEADER: &str = "Remote-User";

/// Roles header prefix used by the SSO authenticator out of the box.
pub const DEFAULT_ROLES_HEADER: &str = "Roles";

/// Email domain shown when the configuration leaves it empty.
pub const DEFAULT_EMAIL_DOMAIN: &str = "localhost";
