//! Document number allocation.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use chrono::{Datelike, Utc};
use eximflow_core::DocumentType;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError, extract::AppJson, middleware::Tenant};

/// Creates the numbering routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/document-numbers", post(next_number))
}

/// Request body for allocating a number.
#[derive(Debug, Deserialize)]
pub struct NextNumberRequest {
    /// Document type key (`quote`, `proforma`, ...).
    pub document_type: String,
    /// Year; defaults to the current year.
    pub year: Option<i32>,
}

/// Allocated number.
#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    /// Formatted number such as `QT-2025-004`.
    pub number: String,
}

/// POST `/document-numbers` - Reserve the next number for a document type.
async fn next_number(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppJson(body): AppJson<NextNumberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let document = DocumentType::parse(&body.document_type).ok_or_else(|| {
        ApiError::validation(format!("Unknown document type '{}'", body.document_type))
    })?;
    let year = body.year.unwrap_or_else(|| Utc::now().year());

    let number = state
        .numbering()
        .next_number(ctx.company_id, document, year)
        .await?;

    info!(company_id = %ctx.company_id, number = %number, "Document number allocated");
    Ok(Json(NextNumberResponse { number }))
}
