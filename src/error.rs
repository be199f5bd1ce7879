use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::service::wire::ErrorResponse;

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        Self::TransportError(format!("JSON serialization error: {}", err))
    }
}

impl From<reqwest::Error> for LogError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportError(format!("HTTP error: {}", err))
    }
}

impl From<config::ConfigError> for LogError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum LogError {
    #[error("{0}")]
    OutOfRange(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Hash function error: {0}")]
    HashFunctionError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LogError {
    pub fn index_out_of_range(index: usize, max_index: usize) -> Self {
        Self::OutOfRange(format!(
            "index out of range: {} (max index {})",
            index, max_index
        ))
    }

    pub fn size_out_of_range(size: i64, leaf_count: usize) -> Self {
        Self::OutOfRange(format!(
            "size out of range: {} (leaf count {})",
            size, leaf_count
        ))
    }

    /// Stable tag carried in error bodies so the client can rebuild the variant
    pub fn kind(&self) -> &'static str {
        match self {
            LogError::OutOfRange(_) => "out_of_range",
            LogError::TransportError(_) => "transport",
            LogError::HashFunctionError(_) => "hash_function",
            LogError::InvalidRequest(_) => "invalid_request",
            LogError::ConfigError(_) => "config",
        }
    }

    pub fn from_kind(kind: &str, message: String) -> Self {
        match kind {
            "out_of_range" => LogError::OutOfRange(message),
            "hash_function" => LogError::HashFunctionError(message),
            "invalid_request" => LogError::InvalidRequest(message),
            _ => LogError::TransportError(message),
        }
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, LogError::OutOfRange(_))
    }
}

impl IntoResponse for LogError {
    fn into_response(self) -> Response {
        let status = match self {
            LogError::OutOfRange(_) | LogError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            kind: self.kind().to_string(),
            error: match &self {
                LogError::OutOfRange(msg) | LogError::InvalidRequest(msg) => msg.clone(),
                other => other.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
