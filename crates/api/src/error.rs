//! Error to JSON response mapping.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}` with the
//! status code the underlying error declares.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eximflow_core::WorkflowError;
use eximflow_core::render::RenderError;
use eximflow_shared::AppError;
use serde_json::json;
use tracing::error;

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// A workflow rule, lookup or persistence failure.
    Workflow(WorkflowError),
    /// Request plumbing: bad input, missing collaborators.
    App(AppError),
}

impl ApiError {
    /// HTTP status of the error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::Workflow(e) => e.status_code(),
            Self::App(e) => e.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Workflow(e) => e.error_code(),
            Self::App(e) => e.error_code(),
        }
    }

    /// Shorthand for a 400 validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        Self::Workflow(e)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Unsupported(_) => Self::App(AppError::Unavailable(e.to_string())),
            RenderError::Failed(_) => Self::App(AppError::ExternalService(e.to_string())),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::validation(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::validation(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::validation(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Workflow(WorkflowError::Database(detail)) | Self::App(AppError::Database(detail)) => {
                error!(error = %detail, "Database error");
                "An internal error occurred".to_string()
            }
            Self::App(AppError::Internal(detail)) => {
                error!(error = %detail, "Internal error");
                "An internal error occurred".to_string()
            }
            Self::Workflow(e) => e.to_string(),
            Self::App(e) => e.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
