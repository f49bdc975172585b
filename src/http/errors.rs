use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::optimizer::OptimizeError;
use crate::store::StoreError;

/// The boundary contract for failures: a single `error` string field
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<OptimizeError> for HttpError {
    fn from(err: OptimizeError) -> Self {
        let status = match &err {
            OptimizeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            OptimizeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            OptimizeError::Config(_) | OptimizeError::Parse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::MissingCredential | StoreError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            StoreError::Http(_) | StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
