//! HTTP client for the registrar API.
//!
//! Used by the CLI subcommands that talk to a running server. Configuration
//! is via environment variables:
//! - `REGISTRAR_URL` - Base URL (default: `http://localhost:3000/api/v1`)
//! - `REGISTRAR_ADMIN_KEY` - Administrator key, sent as a bearer token (optional for local)

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::api::middleware::ADMIN_KEY_ENV;
use crate::api::ConflictScanResponse;
use crate::engine::{MeetingInterval, RegistrationDecision, WeekProjection};
use crate::models::*;

/// Environment variable holding the API base URL.
pub const URL_ENV: &str = "REGISTRAR_URL";

/// Default URL for local development.
const DEFAULT_URL: &str = "http://localhost:3000/api/v1";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: admin key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the registrar API.
#[derive(Debug, Clone)]
pub struct RegistrarClient {
    base_url: String,
    admin_key: Option<String>,
    client: Client,
}

impl RegistrarClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(URL_ENV).unwrap_or_else(|_| DEFAULT_URL.to_string());
        let admin_key = std::env::var(ADMIN_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self::new(base_url, admin_key)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, admin_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            admin_key,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.admin_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
                StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
                StatusCode::CONFLICT => Err(ClientError::Conflict(body)),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
                _ => Err(ClientError::Server(format!("{}: {}", status, body))),
            }
        }
    }

    /// Check that the server is reachable.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/health")
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Conflict Operations
    // ============================================================

    /// Administrator-wide conflict scan over active courses.
    pub async fn list_conflicts(&self) -> Result<ConflictScanResponse, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/conflicts")
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Dry-run the registration gate.
    pub async fn check_registration(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<RegistrationDecision, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/conflicts/check")
            .json(&CheckRegistrationInput {
                student_id,
                course_id,
            })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Parse a schedule string on the server.
    pub async fn parse_schedule(&self, schedule: &str) -> Result<Vec<MeetingInterval>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/schedule/parse")
            .query(&[("schedule", schedule)])
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ============================================================
    // Student Operations
    // ============================================================

    pub async fn get_student(&self, id: Uuid) -> Result<Student, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/students/{}", id))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Week grid of a student's registered courses.
    pub async fn student_schedule(&self, id: Uuid) -> Result<WeekProjection, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/students/{}/schedule", id))
            .send()
            .await?;
        self.handle_response(response).await
    }
}
