//! HTTP error envelope (spec §7 "user-visible" requirement), wrapping
//! `universe_core::error::CoreError` the way the teacher's `error.rs` wraps
//! its own domain errors into `ErrorResponse`/`ErrorDetail`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use universe_core::error::CoreError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub reason: String,
    pub remediation: String,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    BadRequest(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => match err {
                CoreError::Contract { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CoreError::CapabilityMissing { .. } => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::Range { .. } | CoreError::Stride28 { .. } => StatusCode::BAD_REQUEST,
                CoreError::InsufficientInventory { .. }
                | CoreError::PoolExhausted { .. }
                | CoreError::ProviderTimeout { .. }
                | CoreError::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> String {
        match self {
            ApiError::Core(err) => err.kind().as_code().to_string(),
            ApiError::BadRequest(_) => "BAD_REQUEST".to_string(),
            ApiError::Unavailable(_) => "SERVICE_UNAVAILABLE".to_string(),
            ApiError::Internal(_) => "INTERNAL_ERROR".to_string(),
        }
    }

    fn reason(&self) -> String {
        match self {
            ApiError::Core(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::Unavailable(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
        }
    }

    fn remediation(&self) -> String {
        match self {
            ApiError::Core(err) => err.remediation(),
            ApiError::BadRequest(_) => "request a supported format/compression combination".into(),
            ApiError::Unavailable(_) => "retry shortly; the canonical store may still be seeding".into(),
            ApiError::Internal(_) => "this is a server bug; it has been logged".into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let request_id = Uuid::new_v4().to_string();
        let body = ErrorBody {
            code: self.code(),
            message: self.reason(),
            reason: self.code(),
            remediation: self.remediation(),
            request_id: request_id.clone(),
        };

        tracing::error!(
            request_id = %request_id,
            code = %body.code,
            status = %status,
            "request failed"
        );

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
