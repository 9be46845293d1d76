//! Mapping of domain errors onto HTTP responses

use crate::contact::ContactError;
use crate::network::ApiError;
use crate::search::SearchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Handler failure
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("sign in required")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self::Search(SearchError::Api(e))
    }
}

fn api_status(error: &ApiError) -> StatusCode {
    match error {
        ApiError::Client { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
        }
        ApiError::Server { .. }
        | ApiError::Decoding(_)
        | ApiError::TooManyRedirects
        | ApiError::ResourceUnavailable => StatusCode::BAD_GATEWAY,
        ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ApiError::HostUnreachable => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::BadUrl(_) | ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Search(SearchError::Api(e)) => api_status(e),
            Self::Search(SearchError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Search(SearchError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Search(SearchError::Offline) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Contact(ContactError::Render(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Contact(ContactError::NoRecipient) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Contact(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Search(SearchError::Api(e)) => e.message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Client { status: 404, body: String::new() }, StatusCode::NOT_FOUND),
            (ApiError::Client { status: 401, body: String::new() }, StatusCode::UNAUTHORIZED),
            (ApiError::Server { status: 500 }, StatusCode::BAD_GATEWAY),
            (ApiError::Decoding("eof".into()), StatusCode::BAD_GATEWAY),
            (ApiError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (ApiError::HostUnreachable, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status(), expected);
        }

        assert_eq!(
            AppError::from(SearchError::Store(StoreError::Poisoned)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(ContactError::EmptyMessage).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
