//! Administrator gate for the HTTP API.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Environment variable holding the administrator API key.
pub const ADMIN_KEY_ENV: &str = "REGISTRAR_ADMIN_KEY";
/// Comma-separated list of allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "REGISTRAR_CORS_ORIGINS";

/// Security configuration loaded from environment variables.
///
/// With no admin key configured every caller is treated as an administrator
/// (local development).
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// Administrator API key (from REGISTRAR_ADMIN_KEY)
    pub admin_key: Option<String>,
    /// Allowed CORS origins (from REGISTRAR_CORS_ORIGINS)
    pub cors_origins: Option<Vec<String>>,
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        let admin_key = std::env::var(ADMIN_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty());

        let cors_origins = std::env::var(CORS_ORIGINS_ENV)
            .ok()
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect());

        Self {
            admin_key,
            cors_origins,
        }
    }

    /// No admin key, permissive CORS.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_admin_key(key: impl Into<String>) -> Self {
        Self {
            admin_key: Some(key.into()),
            cors_origins: None,
        }
    }

    /// Whether the request carries administrator credentials.
    pub fn is_admin(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.admin_key else {
            return true;
        };

        headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }
}

/// Reject requests without administrator credentials.
pub async fn require_admin(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if config.is_admin(request.headers()) {
        return Ok(next.run(request).await);
    }

    if request.headers().contains_key("Authorization") {
        tracing::warn!("Invalid admin key for {}", request.uri().path());
    } else {
        tracing::warn!("Missing Authorization header for {}", request.uri().path());
    }
    Err(StatusCode::UNAUTHORIZED)
}
