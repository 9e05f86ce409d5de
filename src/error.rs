// src/error.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::sales::sale_recorder::SaleError;
use crate::shared::shared_structs::GenericResponse;
use crate::store::StoreError;

/// Error type returned by every route handler.
///
/// Rendered as a [`GenericResponse`] with status `"error"`. Persistence
/// failures only expose a generic message; the detail goes to the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InsufficientStock(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("persistence error: {0}")]
    Persistence(#[source] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

// Postgres SQLSTATE codes
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::Conflict(format!(
                        "A record with the same unique value already exists: {}",
                        db.message()
                    ));
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::Conflict(format!(
                        "The record is referenced by or references missing data: {}",
                        db.message()
                    ));
                }
                _ => {}
            }
        }
        AppError::Persistence(StoreError::Database(e))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Persistence(e)
    }
}

impl From<SaleError> for AppError {
    fn from(e: SaleError) -> Self {
        match e {
            SaleError::Validation(msg) => AppError::Validation(msg),
            e @ SaleError::NotFound(_) => AppError::NotFound(e.to_string()),
            e @ SaleError::InsufficientStock { .. } => AppError::InsufficientStock(e.to_string()),
            SaleError::Persistence(source) => AppError::Persistence(source),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Persistence(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal error while processing the request".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(GenericResponse::error(message))
    }
}
