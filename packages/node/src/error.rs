//! Application-level error type returned by handlers.
//!
//! Every variant renders as a single-error wire document
//! (`{"jsonapi":…,"errors":[{status,title,detail}]}`) with the matching
//! HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use recallwire::{as_error, serialize, SchemaError, SerializeOptions, WireError};

use crate::handlers::Document;
use crate::storage::StorageError;

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    UnprocessableEntity(String),
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (AppError::NotFound(detail)
        | AppError::BadRequest(detail)
        | AppError::Conflict(detail)
        | AppError::UnprocessableEntity(detail)
        | AppError::Internal(detail)) = self;
        let title = status.canonical_reason().unwrap_or("Error");
        let doc = as_error(status.as_u16(), title, Some(detail));
        Document::new(status, serialize(&doc, &SerializeOptions::default())).into_response()
    }
}

impl From<WireError> for AppError {
    fn from(e: WireError) -> Self {
        let detail = e.to_string();
        match e.status() {
            400 => AppError::BadRequest(detail),
            404 => AppError::NotFound(detail),
            422 => AppError::UnprocessableEntity(detail),
            _ => {
                tracing::error!(error = %detail, "serialization failure");
                AppError::Internal(detail)
            }
        }
    }
}

impl From<SchemaError> for AppError {
    fn from(e: SchemaError) -> Self {
        WireError::from(e).into()
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::NotFound("not found".into()),
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            StorageError::Internal(msg) => {
                tracing::error!(error = %msg, "storage failure");
                AppError::Internal(msg)
            }
        }
    }
}
