//! HTTP Basic Authentication for the host page and host WebSocket

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::types::Role;
use crate::ws::{parse_role, WsQuery};

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Username for host panel (None = auth disabled)
    pub username: Option<String>,
    /// Password for host panel
    pub password: Option<String>,
}

impl AuthConfig {
    /// Load auth config from environment variables
    /// HOST_USERNAME and HOST_PASSWORD must both be set to enable auth
    pub fn from_env() -> Self {
        let username = std::env::var("HOST_USERNAME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let password = std::env::var("HOST_PASSWORD")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if username.is_some() && password.is_some() {
            tracing::info!("Host authentication enabled");
            Self { username, password }
        } else {
            if username.is_some() || password.is_some() {
                tracing::warn!(
                    "HOST_USERNAME and HOST_PASSWORD must both be set to enable authentication"
                );
            }
            tracing::warn!("Host authentication DISABLED - anyone can run the game!");
            Self::disabled()
        }
    }

    pub fn disabled() -> Self {
        Self {
            username: None,
            password: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    pub fn validate(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                constant_time_eq(u.as_bytes(), username.as_bytes())
                    && constant_time_eq(p.as_bytes(), password.as_bytes())
            }
            _ => true, // Auth disabled, allow all
        }
    }

    /// Check the `Authorization: Basic ...` header against the configured credentials
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        if !self.is_enabled() {
            return true;
        }
        basic_credentials(headers)
            .map(|(user, pass)| self.validate(&user, &pass))
            .unwrap_or(false)
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Decode `user:pass` from a Basic Authorization header
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn unauthorized(realm: &str) -> Response<Body> {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{}\"", realm))],
        "Unauthorized",
    )
        .into_response()
}

/// Whether a WebSocket request asks for the host role, decoded the same way `ws_handler` decodes it
fn requests_host_role(request: &Request<Body>) -> bool {
    Query::<WsQuery>::try_from_uri(request.uri())
        .map(|Query(params)| parse_role(params.role.as_deref()) == Role::Host)
        .unwrap_or(false)
}

/// Middleware for HTTP Basic Authentication on host routes
pub async fn host_auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if auth_config.authorize(request.headers()) {
        next.run(request).await
    } else {
        unauthorized("Chaseboard Host")
    }
}

/// Middleware to require HTTP Basic Auth for host WebSocket connections.
///
/// This prevents display screens from taking over by connecting to `/ws?role=host`.
pub async fn host_ws_auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !requests_host_role(&request) {
        return next.run(request).await;
    }

    if !auth_config.is_enabled() {
        tracing::warn!(
            "Host WebSocket requested but host authentication is DISABLED; set HOST_USERNAME and HOST_PASSWORD to prevent host takeover"
        );
        return next.run(request).await;
    }

    if auth_config.authorize(request.headers()) {
        next.run(request).await
    } else {
        unauthorized("Chaseboard Host (WebSocket)")
    }
}

/// Handler to serve host.html (used with auth middleware)
pub async fn serve_host() -> impl IntoResponse {
    match tokio::fs::read_to_string("static/host.html").await {
        Ok(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Host page not found").into_response(),
    }
}
