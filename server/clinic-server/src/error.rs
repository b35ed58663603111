//! HTTP error envelope and extractor rejection mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::{MultipartError, MultipartRejection},
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::{codes, ClinicError, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

/// Body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// One of `invalid_request`, `not_found`, `conflict`, `unauthorized`, `internal_error`
    #[schema(example = "not_found")]
    pub error: String,
    /// Human-readable; clients must not parse it
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    InvalidRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest { .. } => codes::INVALID_REQUEST,
            ApiError::NotFound { .. } => codes::NOT_FOUND,
            ApiError::Conflict { .. } => codes::CONFLICT,
            ApiError::Unauthorized { .. } => codes::UNAUTHORIZED,
            ApiError::Internal { .. } => codes::INTERNAL_ERROR,
        }
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        let message = err.message().to_string();
        match err.kind() {
            ErrorKind::InvalidRequest => ApiError::InvalidRequest { message },
            ErrorKind::NotFound => ApiError::NotFound { message },
            ErrorKind::Conflict => ApiError::Conflict { message },
            ErrorKind::Unauthorized => ApiError::Unauthorized { message },
            ErrorKind::Internal => ApiError::Internal { message },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::invalid_request(format!("invalid upload: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            error!(
                error_code = self.error_code(),
                status_code = status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_code = self.error_code(),
                status_code = status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let body = ApiErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
        };
        (status_code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `Json` whose rejections use the error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections use the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` whose rejections use the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn service_errors_keep_kind_and_message() {
        let cases = [
            (ClinicError::invalid_request("create patient", "first_name is required"), 400, "invalid_request"),
            (ClinicError::not_found("get patient"), 404, "not_found"),
            (ClinicError::conflict("register"), 409, "conflict"),
            (ClinicError::unauthorized("login"), 401, "unauthorized"),
            (ClinicError::internal("backup", "pg_dump failed"), 500, "internal_error"),
        ];
        for (err, status, code) in cases {
            let message = err.message().to_string();
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status().as_u16(), status);
            let body = body_json(response).await;
            assert_eq!(body["error"], code);
            assert_eq!(body["message"], message.as_str());
        }
    }
}
