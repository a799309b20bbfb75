//! Shipping bill routes. Bills are created from export orders.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::info;
use uuid::Uuid;

use super::{ListQuery, RejectRequest, StatusRequest, paged};
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::Tenant,
};

/// Creates the shipping bill routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shipping-bills", get(list_bills))
        .route("/shipping-bills/{id}", get(get_bill))
        .route("/shipping-bills/{id}/approve", post(approve_bill))
        .route("/shipping-bills/{id}/reject", post(reject_bill))
        .route("/shipping-bills/{id}/file", post(file_bill))
        .route("/shipping-bills/{id}/status", post(update_status))
}

/// GET `/shipping-bills`
async fn list_bills(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page();
    let rows = state
        .shipping_bills()
        .list(ctx.company_id, &query.filter(), &page)
        .await?;
    Ok(Json(paged(rows, &page)))
}

/// GET `/shipping-bills/{id}`
async fn get_bill(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.shipping_bills().get(ctx.company_id, id).await?))
}

/// POST `/shipping-bills/{id}/approve` - Approval files the bill.
async fn approve_bill(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let bill = state
        .shipping_bills()
        .approve(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, bill_id = %id, approver = %ctx.user_id, "Shipping bill approved");
    Ok(Json(bill))
}

/// POST `/shipping-bills/{id}/reject`
async fn reject_bill(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let bill = state
        .shipping_bills()
        .reject(ctx.company_id, id, ctx.user_id, &body.reason)
        .await?;
    info!(company_id = %ctx.company_id, bill_id = %id, "Shipping bill rejected");
    Ok(Json(bill))
}

/// POST `/shipping-bills/{id}/file`
async fn file_bill(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let bill = state
        .shipping_bills()
        .file(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, bill_id = %id, "Shipping bill filed");
    Ok(Json(bill))
}

/// POST `/shipping-bills/{id}/status` - Customs progress (assessed, cleared, shipped).
async fn update_status(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let bill = state
        .shipping_bills()
        .update_status(ctx.company_id, id, ctx.user_id, &body.status)
        .await?;
    info!(company_id = %ctx.company_id, bill_id = %id, status = %bill.status, "Shipping bill status updated");
    Ok(Json(bill))
}
