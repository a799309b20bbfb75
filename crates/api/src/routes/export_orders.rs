//! Export order routes: lifecycle, shipping bill conversion and shipments.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use eximflow_db::repositories::{CreateExportOrderInput, CreateShipmentInput, ShippingBillInput};
use tracing::info;
use uuid::Uuid;

use super::{ListQuery, RejectRequest, StatusRequest, paged};
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::Tenant,
};

/// Creates the export order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/export-orders", get(list_orders).post(create_order))
        .route("/export-orders/{id}", get(get_order))
        .route("/export-orders/{id}/approve", post(approve_order))
        .route("/export-orders/{id}/reject", post(reject_order))
        .route("/export-orders/{id}/status", post(update_status))
        .route(
            "/export-orders/{id}/shipping-bills",
            post(convert_to_shipping_bill),
        )
        .route(
            "/export-orders/{id}/shipments",
            get(list_shipments).post(create_shipment),
        )
        .route("/export-orders/{id}/shippable-items", get(shippable_items))
}

/// POST `/export-orders`
async fn create_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppJson(body): AppJson<CreateExportOrderInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state
        .export_orders()
        .create(ctx.company_id, ctx.user_id, body)
        .await?;
    info!(
        company_id = %ctx.company_id,
        order_id = %detail.order.id,
        number = %detail.order.order_number,
        "Export order created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET `/export-orders`
async fn list_orders(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page();
    let rows = state
        .export_orders()
        .list(ctx.company_id, &query.filter(), &page)
        .await?;
    Ok(Json(paged(rows, &page)))
}

/// GET `/export-orders/{id}`
async fn get_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.export_orders().get(ctx.company_id, id).await?))
}

/// POST `/export-orders/{id}/approve`
async fn approve_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let order = state
        .export_orders()
        .approve(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, order_id = %id, approver = %ctx.user_id, "Export order approved");
    Ok(Json(order))
}

/// POST `/export-orders/{id}/reject`
async fn reject_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let order = state
        .export_orders()
        .reject(ctx.company_id, id, ctx.user_id, &body.reason)
        .await?;
    info!(company_id = %ctx.company_id, order_id = %id, "Export order rejected");
    Ok(Json(order))
}

/// POST `/export-orders/{id}/status` - Advance fulfilment (confirmed, in production, ...).
async fn update_status(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let order = state
        .export_orders()
        .update_status(ctx.company_id, id, ctx.user_id, &body.status)
        .await?;
    info!(company_id = %ctx.company_id, order_id = %id, status = %order.status, "Export order status updated");
    Ok(Json(order))
}

/// POST `/export-orders/{id}/shipping-bills` - Draft a shipping bill for the order.
async fn convert_to_shipping_bill(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<ShippingBillInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let bill = state
        .conversions()
        .order_to_shipping_bill(ctx.company_id, id, ctx.user_id, body)
        .await?;
    info!(company_id = %ctx.company_id, order_id = %id, bill_id = %bill.id, "Shipping bill drafted from order");
    Ok((StatusCode::CREATED, Json(bill)))
}

/// GET `/export-orders/{id}/shippable-items` - Quantities still to ship per line.
async fn shippable_items(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.shipments().shippable_items(ctx.company_id, id).await?,
    ))
}

/// GET `/export-orders/{id}/shipments`
async fn list_shipments(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.shipments().list_for_order(ctx.company_id, id).await?,
    ))
}

/// POST `/export-orders/{id}/shipments`
async fn create_shipment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<CreateShipmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let shipment = state
        .shipments()
        .create(ctx.company_id, id, ctx.user_id, body)
        .await?;
    info!(
        company_id = %ctx.company_id,
        order_id = %id,
        shipment_id = %shipment.shipment.id,
        lines = shipment.items.len(),
        "Shipment recorded"
    );
    Ok((StatusCode::CREATED, Json(shipment)))
}
