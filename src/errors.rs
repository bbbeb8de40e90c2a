#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("session expired")]
    SessionExpired,

    #[error("access denied")]
    AccessDenied,

    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ClientError {
    /// Stable message suitable for showing to the user. Screens surface
    /// these in alerts or inline error states; nothing here is fatal.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::Network(_) => "Network error. Please check your connection and try again.",
            ClientError::SessionExpired => "Your session has expired. Please log in again.",
            ClientError::AccessDenied => "You don't have access to this resource.",
            ClientError::Http { .. } => "Something went wrong. Please try again.",
            ClientError::Malformed(_) => "Something went wrong. Please try again.",
            ClientError::Token(_) => "Your session has expired. Please log in again.",
            ClientError::Storage(_) | ClientError::Encoding(_) => {
                "Could not read saved data. Please try again."
            }
        }
    }

    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => ClientError::SessionExpired,
            403 => ClientError::AccessDenied,
            _ => ClientError::Http {
                status,
                message: message.unwrap_or_else(|| "request failed".to_string()),
            },
        }
    }
}
