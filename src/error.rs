//! Error types for Libreria server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

const INTERNAL_MESSAGE: &str = "oops, something went wrong";
const UNAVAILABLE_MESSAGE: &str = "service unavailable";

/// A single failing field of a request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn invalid_book_id() -> Self {
        Self::bad_request("invalid book id")
    }

    pub fn book_not_found(id: i32) -> Self {
        AppError::NotFound(format!("book {} does not exist", id))
    }

    /// Report the failures of field `from` under the name `to`
    pub fn with_field_renamed(self, from: &str, to: &str) -> Self {
        match self {
            AppError::BadRequest { message, mut fields } => {
                fields
                    .iter_mut()
                    .filter(|f| f.field == from)
                    .for_each(|f| f.field = to.to_string());
                sort_fields(&mut fields);
                AppError::BadRequest { message, fields }
            }
            other => other,
        }
    }

    /// Status code this error is rendered with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(e) => match e {
                sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
                e if is_connectivity_error(e) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

fn is_connectivity_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| FieldError {
                    field: field.clone(),
                    reason: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        sort_fields(&mut fields);

        AppError::BadRequest {
            message: "validation failed".to_string(),
            fields,
        }
    }
}

fn sort_fields(fields: &mut [FieldError]) {
    fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.reason.cmp(&b.reason)));
}

/// Error response body
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors) = match self {
            AppError::BadRequest { message, fields } => (message, fields),
            AppError::NotFound(msg) => (msg, Vec::new()),
            AppError::Database(sqlx::Error::RowNotFound) => {
                ("book does not exist".to_string(), Vec::new())
            }
            AppError::Database(e) if status == StatusCode::SERVICE_UNAVAILABLE => {
                tracing::error!("Database unavailable: {:?}", e);
                (UNAVAILABLE_MESSAGE.to_string(), Vec::new())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (INTERNAL_MESSAGE.to_string(), Vec::new())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (INTERNAL_MESSAGE.to_string(), Vec::new())
            }
            AppError::Unavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (UNAVAILABLE_MESSAGE.to_string(), Vec::new())
            }
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
