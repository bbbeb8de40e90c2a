pub mod endpoints;
pub mod token;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ClientError;
pub use token::{StaticTokens, TokenManager};

/// Normalized result of an API call. Non-2xx responses are soft failures
/// (`ok = false` plus whatever message the backend sent), never errors;
/// `Err` is reserved for transport faults, malformed bodies, and
/// unrecoverable auth failures.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub status: u16,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Error view of a soft failure, mapped per the status taxonomy.
    pub fn err(&self) -> Option<ClientError> {
        if self.ok {
            None
        } else {
            Some(ClientError::from_status(self.status, self.message.clone()))
        }
    }
}

/// Backend response envelope: `{ status: "success" | ..., data, message? }`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated HTTP client for the marketplace backend.
///
/// Attaches the bearer token from the [`TokenManager`], refreshes it once
/// on 401 and retries; a second rejection invokes the manager's
/// auth-failure hook and surfaces [`ClientError::SessionExpired`].
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenManager>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenManager>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::POST, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::PUT, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.request(Method::DELETE, path, None).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>, ClientError> {
        let request_id = Uuid::new_v4();
        let mut token = self.tokens.access_token().await?;
        let mut refreshed = false;

        loop {
            let url = format!("{}{}", self.base_url, path);
            let mut req = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .header("x-request-id", request_id.to_string());
            if let Some(ref json) = body {
                req = req.json(json);
            }

            let resp = req.send().await?;
            let status = resp.status();

            if status.as_u16() == 401 {
                if refreshed {
                    tracing::warn!(%request_id, path, "token rejected after refresh, logging out");
                    self.tokens.on_auth_failure().await;
                    return Err(ClientError::SessionExpired);
                }
                refreshed = true;
                match self.tokens.refresh().await {
                    Ok(new_token) => {
                        tracing::debug!(%request_id, path, "access token refreshed, retrying");
                        token = new_token;
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(%request_id, path, error = %e, "token refresh failed");
                        self.tokens.on_auth_failure().await;
                        return Err(ClientError::SessionExpired);
                    }
                }
            }

            if !status.is_success() {
                let message = resp
                    .json::<Envelope<serde_json::Value>>()
                    .await
                    .ok()
                    .and_then(|env| env.message);
                tracing::debug!(%request_id, path, status = status.as_u16(), "request failed");
                return Ok(ApiResponse {
                    ok: false,
                    status: status.as_u16(),
                    data: None,
                    message,
                });
            }

            let envelope: Envelope<T> = resp
                .json()
                .await
                .map_err(|e| ClientError::Malformed(e.to_string()))?;
            let ok = envelope
                .status
                .as_deref()
                .map(|s| s == "success")
                .unwrap_or(true);
            return Ok(ApiResponse {
                ok,
                status: status.as_u16(),
                data: envelope.data,
                message: envelope.message,
            });
        }
    }
}
