use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the portal. Auth and Validation are shown to the user
/// immediately; NotFound during profile resolution forces a sign-out;
/// Network failures in background work are logged and the previous state
/// kept.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },
}

impl ClientError {
    /// Maps an HTTP error status and the server's message onto the taxonomy.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Auth(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                ClientError::Validation(message)
            }
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                ClientError::Network(message)
            }
            other => ClientError::Backend {
                status: other.as_u16(),
                message,
            },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Auth(_) => "AUTH",
            ClientError::NotFound(_) => "NOT_FOUND",
            ClientError::Network(_) => "NETWORK",
            ClientError::Validation(_) => "VALIDATION",
            ClientError::Forbidden(_) => "FORBIDDEN",
            ClientError::Backend { .. } => "BACKEND",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Backend {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: format!("unreadable response: {}", err),
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
