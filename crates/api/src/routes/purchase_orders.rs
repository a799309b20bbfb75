//! Purchase order routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use eximflow_db::repositories::{CreatePurchaseOrderInput, PurchaseOrderPaymentInput};
use tracing::info;
use uuid::Uuid;

use super::{ListQuery, RejectRequest, StatusRequest, paged};
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::Tenant,
};

/// Creates the purchase order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchase-orders", get(list_orders).post(create_order))
        .route("/purchase-orders/{id}", get(get_order))
        .route("/purchase-orders/{id}/submit", post(submit_order))
        .route("/purchase-orders/{id}/approve", post(approve_order))
        .route("/purchase-orders/{id}/reject", post(reject_order))
        .route("/purchase-orders/{id}/status", post(update_status))
        .route("/purchase-orders/{id}/payments", post(record_payment))
}

/// POST `/purchase-orders`
async fn create_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppJson(body): AppJson<CreatePurchaseOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state
        .purchase_orders()
        .create(ctx.company_id, ctx.user_id, body)
        .await?;
    info!(
        company_id = %ctx.company_id,
        po_id = %detail.order.id,
        number = %detail.order.po_number,
        "Purchase order created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET `/purchase-orders`
async fn list_orders(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page();
    let rows = state
        .purchase_orders()
        .list(ctx.company_id, &query.filter(), &page)
        .await?;
    Ok(Json(paged(rows, &page)))
}

/// GET `/purchase-orders/{id}`
async fn get_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.purchase_orders().get(ctx.company_id, id).await?))
}

/// POST `/purchase-orders/{id}/submit`
async fn submit_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let order = state
        .purchase_orders()
        .submit(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, po_id = %id, "Purchase order submitted");
    Ok(Json(order))
}

/// POST `/purchase-orders/{id}/approve`
async fn approve_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let order = state
        .purchase_orders()
        .approve(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, po_id = %id, approver = %ctx.user_id, "Purchase order approved");
    Ok(Json(order))
}

/// POST `/purchase-orders/{id}/reject`
async fn reject_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let order = state
        .purchase_orders()
        .reject(ctx.company_id, id, ctx.user_id, &body.reason)
        .await?;
    info!(company_id = %ctx.company_id, po_id = %id, "Purchase order rejected");
    Ok(Json(order))
}

/// POST `/purchase-orders/{id}/status`
async fn update_status(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let order = state
        .purchase_orders()
        .update_status(ctx.company_id, id, ctx.user_id, &body.status)
        .await?;
    info!(company_id = %ctx.company_id, po_id = %id, status = %order.status, "Purchase order status updated");
    Ok(Json(order))
}

/// POST `/purchase-orders/{id}/payments` - Record a payment to the vendor.
async fn record_payment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<PurchaseOrderPaymentInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state
        .purchase_orders()
        .record_payment(ctx.company_id, id, ctx.user_id, body)
        .await?;
    info!(
        company_id = %ctx.company_id,
        po_id = %id,
        paid = %detail.order.paid_amount,
        payment_status = %detail.order.payment_status,
        "Purchase order payment recorded"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}
