use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

use crate::services::bulk::BulkOperationError;

#[derive(Debug)]
pub enum AppError {
    UpstreamApi(String),
    ConfigError(String),
    JsonError(serde_json::Error),
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::UpstreamApi(msg) => write!(f, "Dashboard API error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<BulkOperationError> for AppError {
    fn from(err: BulkOperationError) -> Self {
        match err {
            BulkOperationError::Configuration(e) => AppError::ConfigError(e.to_string()),
            BulkOperationError::EmptySelection => {
                AppError::ValidationError("Nenhuma entidade selecionada".to_string())
            }
            BulkOperationError::Snapshot(e) => AppError::JsonError(e),
            BulkOperationError::Mutation(e) => AppError::UpstreamApi(format!("{:#}", e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::UpstreamApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::JsonError(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = json!({
            "error": error_message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
