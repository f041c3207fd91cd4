//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use network_topology::TopologyError;
use request_lifecycle::LifecycleError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TopologyError> for ApiError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::NodeNotFound(_) | TopologyError::PathNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            TopologyError::DuplicateNode(_) => ApiError::Conflict(err.to_string()),
            TopologyError::Orbital(_) | TopologyError::MalformedFeed { .. } | TopologyError::Json(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            TopologyError::InvalidClock(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Topology(inner) => inner.into(),
            LifecycleError::UnknownServiceClass(_) | LifecycleError::Orbital(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            LifecycleError::DuplicateRequest(_) => ApiError::Conflict(err.to_string()),
            LifecycleError::EmptyRegionTable | LifecycleError::Transport(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorBody {
            ok: false,
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
