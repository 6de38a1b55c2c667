use thiserror::Error;

/// Fallback shown when the server gave no message
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success status with whatever the error envelope carried
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or(GENERIC_ERROR_MESSAGE))]
    Server {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },
    #[error("Session expired or missing. Set api.session_cookie, or api.username and api.password")]
    SessionExpired,
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("Network error: {message}")]
    Network { message: String },
    #[error("Invalid response from server: {message}")]
    InvalidResponse { message: String },
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    /// Refused before reaching the server
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Message suitable for an error banner. Prefers the server-provided text.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message: Some(message), .. } if !message.trim().is_empty() => {
                message.clone()
            }
            ApiError::Server { status, .. } => format!("Request failed with status code {status}"),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::SessionExpired => Some(401),
            _ => None,
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout { timeout_ms }
        } else if err.is_decode() {
            ApiError::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Server {
            status: 422,
            code: Some("VALIDATION".to_string()),
            message: Some("timeout must be in the future".to_string()),
        };
        assert_eq!(err.user_message(), "timeout must be in the future");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_user_message_falls_back_to_status() {
        let err = ApiError::Server {
            status: 500,
            code: None,
            message: Some("   ".to_string()),
        };
        assert_eq!(err.user_message(), "Request failed with status code 500");
        assert_eq!(err.to_string(), format!("HTTP 500: {GENERIC_ERROR_MESSAGE}"));
    }

    #[test]
    fn test_non_server_errors_use_display() {
        let err = ApiError::Timeout { timeout_ms: 30000 };
        assert_eq!(err.user_message(), "Request timed out after 30000ms");

        let err = ApiError::Rejected("Timer locks cannot be deleted".to_string());
        assert_eq!(err.user_message(), "Timer locks cannot be deleted");
    }
}
