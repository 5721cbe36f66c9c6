use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Shared HTTP result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure surfaced to HTTP clients as `{ "mensaje", "detalle"? }`.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Internal {
        message: String,
        cause: Arc<anyhow::Error>,
    },
}

/// JSON body written for every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalle: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Wrap an unexpected failure behind a generic, operation-specific message.
    pub fn internal(message: impl Into<String>, err: anyhow::Error) -> Self {
        Self::Internal {
            message: message.into(),
            cause: Arc::new(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::BadRequest(message) | ApiError::NotFound(message) => ErrorBody {
                mensaje: message.clone(),
                detalle: None,
            },
            ApiError::Internal { message, cause } => ErrorBody {
                mensaje: message.clone(),
                detalle: Some(format!("{cause:#}")),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal { message, cause } = &self {
            tracing::error!(error = %format!("{cause:#}"), "{message}");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
