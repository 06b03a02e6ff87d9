//! API client for the recycle backend.
//!
//! The backend exposes a single unauthenticated endpoint used here:
//! `POST /login` with a JSON `{ email, password }` body, answering with a
//! JSON object that carries the session `token`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Credentials;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Production backend base URL
pub const DEFAULT_API_BASE_URL: &str = "https://waste-recycle-app-backend.onrender.com";

/// Path of the login endpoint, relative to the base URL
const LOGIN_PATH: &str = "/login";

/// HTTP request timeout in seconds.
/// The backend runs on a host that cold-starts, so keep this generous.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: String,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// API client for the recycle backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client pointed at the production backend
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }

    /// Create a client pointed at another backend (staging, mock server)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::with_base_url_and_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Like [`ApiClient::with_base_url`], with a custom per-request timeout
    pub fn with_base_url_and_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a session token.
    ///
    /// The email is sent lowercased; the password is sent as typed.
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let body = LoginRequest {
            email: credentials.normalized_email(),
            password: &credentials.password,
        };

        debug!(url = %url, email = %body.email, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send login request")?;

        let response = Self::check_response(response).await?;

        let parsed: LoginResponse = response
            .json()
            .await
            .map_err(ApiError::from)
            .context("Failed to parse login response")?;

        match parsed.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ApiError::InvalidResponse("login response has no token".to_string()).into()),
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}
