// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Body returned to the client for every failed request.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Account is deactivated")]
    AccountInactive,

    #[error("Company is inactive")]
    CompanyInactive,

    #[error("{0}")]
    Forbidden(String),

    #[error("A super-admin already exists")]
    SuperadminAlreadyExists,

    #[error("A super-admin must exist before sub-admins can sign up")]
    SuperadminMissing,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    DuplicateName(String),

    #[error("{0} is already inactive")]
    AlreadyInactive(String),

    #[error("Insufficient stock for {name}. Available: {available}, requested: {requested}")]
    InsufficientStock {
        name: String,
        available: i32,
        requested: i32,
    },

    #[error("{field} does not match the order lines: expected {expected}, received {received}")]
    TotalsMismatch {
        field: &'static str,
        expected: Decimal,
        received: Decimal,
    },

    #[error("Order {order_id} was placed but invoice generation failed: {reason}")]
    InvoiceFailed { order_id: Uuid, reason: String },

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::SuperadminMissing
            | AppError::DuplicateName(_)
            | AppError::AlreadyInactive(_)
            | AppError::InsufficientStock { .. }
            | AppError::TotalsMismatch { .. } => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists | AppError::SuperadminAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AccountInactive | AppError::CompanyInactive | AppError::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvoiceFailed { .. }
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        let status = self.status();
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status,
                    error: "One or more fields are invalid.".into(),
                    details: Some(json!(details)),
                }
            }
            AppError::InvoiceFailed { order_id, .. } => {
                tracing::error!(%order_id, error = %self, "Invoice pipeline failed");
                ApiError {
                    status,
                    error: "Order was placed but the invoice could not be generated. Retry the invoice later.".into(),
                    details: Some(json!({ "orderId": order_id })),
                }
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => {
                tracing::error!(error = ?self, "Internal server error");
                ApiError {
                    status,
                    error: "An unexpected error occurred.".into(),
                    details: None,
                }
            }
            other => ApiError {
                status,
                error: other.to_string(),
                details: None,
            },
        }
    }

    /// Maps a unique-violation from Postgres into a domain error, passing anything else through.
    pub fn from_unique_violation(err: sqlx::Error, on_conflict: impl FnOnce() -> AppError) -> AppError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return on_conflict();
            }
        }
        err.into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}
