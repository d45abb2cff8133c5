use super::auth;
use super::error::ApiError;
use super::service::ServerState;
use crate::authenticator::{Slice, SsoAuthSettings, TrustedHeaderSettings};
use crate::client::{RoleList, RoleSummary, ROLES_PATH};
use crate::plugins::AuthenticatorPanel;

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build all routes. Everything except the health check requires auth.
pub fn build_routes(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            &Slice::Sso.config_path(),
            get(sso_config_handler).put(update_sso_config_handler),
        )
        .route(
            &Slice::TrustedHeaders.config_path(),
            get(trusted_headers_config_handler).put(update_trusted_headers_config_handler),
        )
        .route(ROLES_PATH, get(roles_handler))
        .route("/api/plugins", get(plugins_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/api/health", get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
    uptime: u64,
}

async fn health_handler(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.version.clone(),
        uptime: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// SSO
// ============================================================================

async fn sso_config_handler(
    State(state): State<ServerState>,
) -> Result<Json<SsoAuthSettings>, ApiError> {
    let settings: SsoAuthSettings = state.settings.get_or_default(Slice::Sso)?;
    Ok(Json(
        settings.with_trusted_proxies(state.trusted_proxies_display()),
    ))
}

/// Trusted proxies come from the server configuration and are never stored.
async fn update_sso_config_handler(
    State(state): State<ServerState>,
    payload: Result<Json<SsoAuthSettings>, JsonRejection>,
) -> Result<Json<SsoAuthSettings>, ApiError> {
    let Json(settings) = payload?;
    settings.validate()?;

    state
        .settings
        .write(Slice::Sso, &settings.with_trusted_proxies(None))
        .await?;
    audit_update(Slice::Sso);

    Ok(Json(
        settings.with_trusted_proxies(state.trusted_proxies_display()),
    ))
}

// ============================================================================
// Trusted Headers
// ============================================================================

async fn trusted_headers_config_handler(
    State(state): State<ServerState>,
) -> Result<Json<TrustedHeaderSettings>, ApiError> {
    let settings: TrustedHeaderSettings = state.settings.get_or_default(Slice::TrustedHeaders)?;
    Ok(Json(settings))
}

async fn update_trusted_headers_config_handler(
    State(state): State<ServerState>,
    payload: Result<Json<TrustedHeaderSettings>, JsonRejection>,
) -> Result<Json<TrustedHeaderSettings>, ApiError> {
    let Json(settings) = payload?;
    settings.validate()?;

    state.settings.write(Slice::TrustedHeaders, &settings).await?;
    audit_update(Slice::TrustedHeaders);

    Ok(Json(settings))
}

fn audit_update(slice: Slice) {
    info!(
        target: "audit",
        event_type = slice.audit_event_type(),
        permission = slice.permissions().update,
        slice = %slice,
        "Authenticator configuration updated"
    );
}

// ============================================================================
// Roles
// ============================================================================

async fn roles_handler(State(state): State<ServerState>) -> Json<RoleList> {
    let roles: Vec<RoleSummary> = state
        .config
        .roles
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| role_summary(name))
        .collect();
    Json(RoleList {
        total: roles.len(),
        roles,
    })
}

fn role_summary(name: &str) -> RoleSummary {
    let builtin = match name {
        "Admin" => Some("Grants all permissions for Graylog administrators (built-in)"),
        "Reader" => Some("Grants basic permissions for every Graylog user (built-in)"),
        _ => None,
    };
    RoleSummary {
        name: name.to_string(),
        description: builtin.map(String::from),
        read_only: builtin.is_some(),
    }
}

// ============================================================================
// Plugins
// ============================================================================

async fn plugins_handler(State(state): State<ServerState>) -> Json<Vec<AuthenticatorPanel>> {
    Json(state.panels.list().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{header, Method, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn state(config: ServerConfig) -> ServerState {
        ServerState::new(&config).unwrap()
    }

    fn local_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let mut request = builder.body(body).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        request
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn sso_defaults_include_trusted_proxies() {
        let config = ServerConfig {
            trusted_proxies: vec!["10.0.0.0/8".into(), "127.0.0.1/32".into()],
            ..Default::default()
        };
        let app = build_routes(state(config));

        let (status, body) = call(
            app,
            local_request(Method::GET, &Slice::Sso.config_path(), None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username_header"], "Remote-User");
        assert_eq!(body["auto_create_user"], true);
        assert_eq!(body["require_trusted_proxies"], true);
        assert_eq!(body["roles_header"], "Roles");
        assert_eq!(body["trusted_proxies"], "10.0.0.0/8, 127.0.0.1/32");
    }

    #[tokio::test]
    async fn sso_update_strips_trusted_proxies_from_storage() {
        let config = ServerConfig {
            trusted_proxies: vec!["10.0.0.0/8".into()],
            ..Default::default()
        };
        let state = state(config);
        let app = build_routes(state.clone());

        let (status, body) = call(
            app,
            local_request(
                Method::PUT,
                &Slice::Sso.config_path(),
                Some(json!({
                    "username_header": "X-User",
                    "auto_create_user": true,
                    "trusted_proxies": "0.0.0.0/0"
                })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username_header"], "X-User");
        assert_eq!(body["trusted_proxies"], "10.0.0.0/8");

        let stored: SsoAuthSettings = state.settings.get(Slice::Sso).unwrap().unwrap();
        assert_eq!(stored.trusted_proxies, None);
        assert_eq!(stored.username_header, "X-User");
    }

    #[tokio::test]
    async fn invalid_settings_rejected_with_structured_body() {
        let app = build_routes(state(ServerConfig::default()));

        let (status, body) = call(
            app,
            local_request(
                Method::PUT,
                &Slice::Sso.config_path(),
                Some(json!({"username_header": "Remote-User", "sync_roles": true, "roles_header": ""})),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "type": "ApiError",
                "message": "roles_header must not be empty when sync_roles is enabled"
            })
        );
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = build_routes(state(ServerConfig::default()));

        let (status, body) = call(
            app,
            local_request(
                Method::PUT,
                &Slice::TrustedHeaders.config_path(),
                Some(json!({"auto_create_user": "yes"})),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "ApiError");
        assert!(body["message"].as_str().unwrap().contains("deserialize"));
    }

    #[tokio::test]
    async fn trusted_headers_round_trip() {
        let state = state(ServerConfig::default());
        let path = Slice::TrustedHeaders.config_path();
        let submitted = json!({
            "username_header": "X-Forwarded-User",
            "fullname_header": "X-Forwarded-Name",
            "email_header": null,
            "default_group": "Admin",
            "auto_create_user": false
        });

        let (status, saved) = call(
            build_routes(state.clone()),
            local_request(Method::PUT, &path, Some(submitted.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved, submitted);

        let (_, loaded) = call(build_routes(state), local_request(Method::GET, &path, None)).await;
        assert_eq!(loaded, submitted);
    }

    #[tokio::test]
    async fn roles_listing() {
        let config = ServerConfig {
            roles: vec!["Admin".into(), "Reader".into(), "Auditor".into(), " ".into()],
            ..Default::default()
        };
        let app = build_routes(state(config));

        let (status, body) = call(app, local_request(Method::GET, ROLES_PATH, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["roles"][0]["name"], "Admin");
        assert_eq!(body["roles"][0]["read_only"], true);
        assert_eq!(body["roles"][2], json!({"name": "Auditor", "description": null, "read_only": false}));
    }

    #[tokio::test]
    async fn plugins_listing() {
        let app = build_routes(state(ServerConfig::default()));
        let (_, body) = call(app, local_request(Method::GET, "/api/plugins", None)).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["sso", "trusted-headers"]);
    }

    #[tokio::test]
    async fn token_required_when_configured() {
        let mut config = ServerConfig::default();
        config.auth.token = Some("s3cret".into());
        let state = state(config);
        let path = Slice::TrustedHeaders.config_path();

        let (status, body) = call(
            build_routes(state.clone()),
            local_request(Method::GET, &path, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or missing token");

        let mut request = local_request(Method::GET, &path, None);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_static("Bearer s3cret"),
        );
        let (status, _) = call(build_routes(state), request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_needs_no_auth() {
        let mut config = ServerConfig::default();
        config.auth.token = Some("s3cret".into());
        let app = build_routes(state(config));

        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn remote_requests_rejected_without_token() {
        let app = build_routes(state(ServerConfig::default()));
        let request = Request::builder()
            .uri(ROLES_PATH)
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
