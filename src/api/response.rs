//! JSON envelope and error mapping shared by all handlers
//!
//! Success: `{ "success": true, "data": ... }`.
//! Failure: `{ "success": false, "message": ..., "details"?: [...] }`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::domain::{DomainError, FieldError};

/// `axum::Json` with rejections reported through the envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(DomainError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections reported through the envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(DomainError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` with rejections reported through the envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(DomainError))]
pub struct ApiQuery<T>(pub T);

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Transaction(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Integrity(_) | DomainError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            if self.is_retryable() {
                tracing::warn!("{}", self);
            } else {
                tracing::error!("{}", self);
            }
        }

        let body = match &self {
            DomainError::Validation { message, details } if !details.is_empty() => {
                json!({ "success": false, "message": message, "details": details })
            }
            DomainError::Validation { message, .. } => {
                json!({ "success": false, "message": message })
            }
            DomainError::Transaction(_) => json!({
                "success": false,
                "message": self.to_string(),
                "retryable": true
            }),
            other => json!({ "success": false, "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for DomainError {
    fn from(rejection: JsonRejection) -> Self {
        DomainError::Validation {
            message: "Invalid request body".to_string(),
            details: vec![FieldError {
                field: "body".to_string(),
                message: rejection.body_text(),
            }],
        }
    }
}

impl From<PathRejection> for DomainError {
    fn from(rejection: PathRejection) -> Self {
        DomainError::Validation {
            message: "Invalid id format".to_string(),
            details: vec![FieldError {
                field: "id".to_string(),
                message: rejection.body_text(),
            }],
        }
    }
}

impl From<QueryRejection> for DomainError {
    fn from(rejection: QueryRejection) -> Self {
        DomainError::Validation {
            message: "Invalid query string".to_string(),
            details: vec![FieldError {
                field: "query".to_string(),
                message: rejection.body_text(),
            }],
        }
    }
}
