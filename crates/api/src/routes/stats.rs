//! Per-document-type statistics.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use eximflow_core::DocumentType;

use crate::{AppState, error::ApiError, extract::AppPath, middleware::Tenant};

/// Creates the stats routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/stats/{document_type}", get(document_stats))
}

/// GET `/stats/{document_type}` - Counts by status, totals and conversions.
async fn document_stats(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(raw): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = DocumentType::parse(&raw)
        .ok_or_else(|| ApiError::validation(format!("Unknown document type '{raw}'")))?;
    Ok(Json(state.stats().stats(ctx.company_id, document).await?))
}
