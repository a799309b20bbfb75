//! Bank realisation certificate routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use eximflow_core::brc::PaymentRequest;
use eximflow_db::repositories::{BrcFilter, CreateBrcInput};
use eximflow_shared::types::PageRequest;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::paged;
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::Tenant,
};

/// Creates the BRC routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/brcs", get(list_brcs).post(create_brc))
        .route("/brcs/compliance", get(compliance))
        .route("/brcs/{id}", get(get_brc))
        .route("/brcs/{id}/payments", post(record_payment))
}

/// Query string for the BRC list.
#[derive(Debug, Default, Deserialize)]
pub struct BrcListQuery {
    /// Realization status (`pending`, `partial`, `full`).
    pub status: Option<String>,
    /// Only overdue (or only not overdue) certificates.
    pub overdue: Option<bool>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// POST `/brcs`
async fn create_brc(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppJson(body): AppJson<CreateBrcInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state.brcs().create(ctx.company_id, ctx.user_id, body).await?;
    info!(
        company_id = %ctx.company_id,
        brc_id = %detail.brc.id,
        expected = %detail.brc.total_expected,
        due = %detail.brc.due_date,
        "BRC created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET `/brcs`
async fn list_brcs(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppQuery(query): AppQuery<BrcListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = BrcFilter {
        status: query.status,
        overdue: query.overdue,
    };
    let rows = state.brcs().list(ctx.company_id, &filter, &page).await?;
    Ok(Json(paged(rows, &page)))
}

/// GET `/brcs/compliance` - Totals plus the overdue and upcoming lists.
async fn compliance(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.brcs().compliance(ctx.company_id, Utc::now()).await?,
    ))
}

/// GET `/brcs/{id}`
async fn get_brc(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.brcs().get(ctx.company_id, id).await?))
}

/// POST `/brcs/{id}/payments` - Record a realization against the certificate.
async fn record_payment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<PaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state
        .brcs()
        .record_payment(ctx.company_id, id, ctx.user_id, body)
        .await?;
    info!(
        company_id = %ctx.company_id,
        brc_id = %id,
        pending = %detail.brc.pending_amount,
        status = %detail.brc.realization_status,
        "BRC payment recorded"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}
