use super::error::ApiError;
use super::service::ServerState;
use crate::config::ServerAuthConfig;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use std::net::SocketAddr;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

// ============================================================================
// Types
// ============================================================================

/// Authentication settings after config and environment are merged.
#[derive(Debug, Clone, Default)]
pub struct ResolvedServerAuth {
    pub token: Option<String>,
}

impl ResolvedServerAuth {
    /// An empty token counts as no token.
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        Self {
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn mode(&self) -> &'static str {
        if self.token.is_some() {
            "token"
        } else {
            "none (local only)"
        }
    }
}

/// Result of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl AuthResult {
    fn success(method: &'static str) -> Self {
        Self {
            ok: true,
            method: Some(method),
            reason: None,
        }
    }

    fn failure(reason: &'static str) -> Self {
        Self {
            ok: false,
            method: None,
            reason: Some(reason),
        }
    }
}

// ============================================================================
// Core Functions
// ============================================================================

/// Decide whether a request may reach the API.
pub fn authorize_request(
    auth: &ResolvedServerAuth,
    bearer: Option<&str>,
    is_local: bool,
) -> AuthResult {
    let Some(expected) = auth.token.as_deref() else {
        if is_local {
            debug!("Allowing local request without auth");
            return AuthResult::success("local");
        }
        return AuthResult::failure("No authentication configured and request is not local");
    };

    match bearer {
        Some(provided) if safe_equal(expected, provided) => AuthResult::success("token"),
        _ => AuthResult::failure("Invalid or missing token"),
    }
}

/// Timing-safe string comparison.
fn safe_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub fn is_local_request(addr: &SocketAddr) -> bool {
    addr.ip().is_loopback()
}

/// Extract bearer token from an Authorization header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    if header.len() > 7 && header[..7].eq_ignore_ascii_case("bearer ") {
        Some(header[7..].trim())
    } else {
        None
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Reject requests that fail [`authorize_request`]. Requests without a known
/// peer address are never treated as local.
pub async fn require_auth(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let is_local = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| is_local_request(addr))
        .unwrap_or(false);
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token);

    let result = authorize_request(&state.auth, bearer, is_local);
    if !result.ok {
        let reason = result.reason.unwrap_or("Unauthorized");
        warn!(path = %request.uri().path(), reason, "Rejected API request");
        return Err(ApiError::unauthorized(reason));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token(token: &str) -> ResolvedServerAuth {
        ResolvedServerAuth {
            token: Some(token.to_string()),
        }
    }

    #[test]
    fn local_requests_pass_without_token() {
        let auth = ResolvedServerAuth::default();
        assert_eq!(authorize_request(&auth, None, true).method, Some("local"));
        assert!(!authorize_request(&auth, None, false).ok);
    }

    #[test]
    fn token_must_match() {
        let auth = with_token("s3cret");
        assert!(authorize_request(&auth, Some("s3cret"), false).ok);
        assert!(!authorize_request(&auth, Some("s3cre"), false).ok);
        assert!(!authorize_request(&auth, Some("wrong!"), true).ok);
        assert!(!authorize_request(&auth, None, true).ok);
    }

    #[test]
    fn blank_configured_token_is_ignored() {
        let auth = ResolvedServerAuth::from_config(&ServerAuthConfig {
            token: Some("  ".into()),
        });
        assert!(auth.token.is_none());
        assert_eq!(auth.mode(), "none (local only)");
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer"), None);
    }
}
