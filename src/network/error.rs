//! Errors surfaced by the backend client

use serde::Deserialize;
use thiserror::Error;

/// Closed set of backend call failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 4xx; the raw body is kept so the backend message can be shown
    #[error("client error {status}: {body}")]
    Client { status: u16, body: String },

    /// 5xx
    #[error("server error {status}")]
    Server { status: u16 },

    /// The response did not have the expected shape
    #[error("failed to decode response: {0}")]
    Decoding(String),

    #[error("bad url: {0}")]
    BadUrl(String),

    #[error("request timed out")]
    Timeout,

    #[error("host unreachable")]
    HostUnreachable,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("resource unavailable")]
    ResourceUnavailable,

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Error body the backend sends with 4xx responses
#[derive(Debug, Deserialize)]
struct BackendFault {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

impl ApiError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400..=499 => Self::Client { status, body },
            500..=599 => Self::Server { status },
            _ => Self::Unexpected(format!("unexpected status {}", status)),
        }
    }

    /// Human readable message for the user
    pub fn message(&self) -> String {
        match self {
            Self::Client { body, .. } => serde_json::from_str::<BackendFault>(body)
                .map(|fault| fault.message)
                .unwrap_or_else(|_| "The request was rejected".to_string()),
            Self::Server { .. } => "The server is having trouble, try again later".to_string(),
            Self::Decoding(_) => "Received data in an unexpected format".to_string(),
            Self::BadUrl(_) => "The request address is invalid".to_string(),
            Self::Timeout => "The request timed out".to_string(),
            Self::HostUnreachable => "The server cannot be reached".to_string(),
            Self::TooManyRedirects => "Too many redirects".to_string(),
            Self::ResourceUnavailable => "The resource is unavailable".to_string(),
            Self::Unexpected(_) => "Something went wrong".to_string(),
        }
    }

    /// Backend error code from a 4xx body, if any
    pub fn backend_code(&self) -> Option<i64> {
        match self {
            Self::Client { body, .. } => serde_json::from_str::<BackendFault>(body)
                .ok()
                .and_then(|fault| fault.code),
            _ => None,
        }
    }

    /// Whether the failure is about reaching the backend rather than its answer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::HostUnreachable | Self::TooManyRedirects | Self::ResourceUnavailable
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::TooManyRedirects
        } else if err.is_connect() {
            Self::HostUnreachable
        } else if err.is_builder() {
            Self::BadUrl(err.to_string())
        } else if err.is_decode() {
            Self::Decoding(err.to_string())
        } else if err.is_body() {
            Self::ResourceUnavailable
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), String::new())
        } else {
            Self::Unexpected(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::BadUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(404, String::new()),
            ApiError::Client { status: 404, .. }
        ));
        assert_eq!(ApiError::from_status(503, String::new()), ApiError::Server { status: 503 });
        assert!(matches!(ApiError::from_status(302, String::new()), ApiError::Unexpected(_)));
    }

    #[test]
    fn test_backend_message_extracted() {
        let err = ApiError::from_status(
            401,
            r#"{"code":3003,"message":"Invalid login or password"}"#.to_string(),
        );
        assert_eq!(err.message(), "Invalid login or password");
        assert_eq!(err.backend_code(), Some(3003));
    }

    #[test]
    fn test_unparseable_body_message() {
        let err = ApiError::from_status(400, "<html>".to_string());
        assert_eq!(err.message(), "The request was rejected");
        assert_eq!(err.backend_code(), None);
    }

    #[test]
    fn test_decoding_is_not_transport() {
        let err: ApiError = serde_json::from_str::<Vec<i32>>("{").unwrap_err().into();
        assert!(matches!(err, ApiError::Decoding(_)));
        assert!(!err.is_transport());
        assert!(ApiError::Timeout.is_transport());
    }
}
