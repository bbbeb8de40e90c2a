use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::ClientError;

/// Source of the bearer token attached to every authenticated request.
///
/// `refresh` is called once when the backend rejects the current token;
/// `on_auth_failure` fires when refresh fails or the refreshed token is
/// still rejected, and is where a host app hooks its logout flow.
#[async_trait]
pub trait TokenManager: Send + Sync {
    async fn access_token(&self) -> Result<String, ClientError>;

    async fn refresh(&self) -> Result<String, ClientError>;

    async fn on_auth_failure(&self) {}
}

/// Token manager over a fixed token with no refresh capability, for
/// headless use where the token is provisioned out of band.
pub struct StaticTokens {
    token: Mutex<String>,
}

impl StaticTokens {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(token.into()),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = token.into();
        }
    }
}

#[async_trait]
impl TokenManager for StaticTokens {
    async fn access_token(&self) -> Result<String, ClientError> {
        self.token
            .lock()
            .map(|t| t.clone())
            .map_err(|_| ClientError::Token("token store poisoned".to_string()))
    }

    async fn refresh(&self) -> Result<String, ClientError> {
        Err(ClientError::Token("no refresh token available".to_string()))
    }
}
