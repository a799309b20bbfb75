//! Proforma invoice routes, including the printable copy.

use axum::{
    Json, Router,
    extract::State,
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post},
};
use eximflow_db::repositories::CreateProformaInput;
use eximflow_shared::AppError;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ListQuery, RejectRequest, paged};
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::Tenant,
};

/// Creates the proforma invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/proforma-invoices",
            get(list_proformas).post(create_proforma),
        )
        .route("/proforma-invoices/{id}", get(get_proforma))
        .route("/proforma-invoices/{id}/pdf", get(download_pdf))
        .route("/proforma-invoices/{id}/submit", post(submit_proforma))
        .route("/proforma-invoices/{id}/approve", post(approve_proforma))
        .route("/proforma-invoices/{id}/reject", post(reject_proforma))
        .route("/proforma-invoices/{id}/revise", post(revise_proforma))
        .route(
            "/proforma-invoices/{id}/convert-to-commercial",
            post(convert_to_commercial),
        )
        .route(
            "/proforma-invoices/{id}/convert-to-order",
            post(convert_to_order),
        )
}

/// POST `/proforma-invoices`
async fn create_proforma(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppJson(body): AppJson<CreateProformaInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state
        .proformas()
        .create(ctx.company_id, ctx.user_id, body)
        .await?;
    info!(
        company_id = %ctx.company_id,
        invoice_id = %detail.invoice.id,
        number = %detail.invoice.invoice_number,
        "Proforma invoice created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET `/proforma-invoices`
async fn list_proformas(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page();
    let rows = state
        .proformas()
        .list(ctx.company_id, &query.filter(), &page)
        .await?;
    Ok(Json(paged(rows, &page)))
}

/// GET `/proforma-invoices/{id}`
async fn get_proforma(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.proformas().get(ctx.company_id, id).await?))
}

/// GET `/proforma-invoices/{id}/pdf` - Render the invoice.
///
/// Returns 503 when no renderer is configured.
async fn download_pdf(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(renderer) = state.renderer.clone() else {
        return Err(AppError::Unavailable("Document rendering is not configured".to_string()).into());
    };

    let detail = state.proformas().get(ctx.company_id, id).await?;
    let snapshot = detail.snapshot()?;
    let bytes = renderer.render(&snapshot).inspect_err(|e| {
        warn!(company_id = %ctx.company_id, invoice_id = %id, error = %e, "Rendering failed");
    })?;

    Ok((
        [
            (CONTENT_TYPE, renderer.content_type().to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", snapshot.file_name()),
            ),
        ],
        bytes,
    ))
}

/// POST `/proforma-invoices/{id}/submit`
async fn submit_proforma(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let invoice = state
        .proformas()
        .submit(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, invoice_id = %id, "Proforma invoice submitted");
    Ok(Json(invoice))
}

/// POST `/proforma-invoices/{id}/approve`
async fn approve_proforma(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let invoice = state
        .proformas()
        .approve(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, invoice_id = %id, approver = %ctx.user_id, "Proforma invoice approved");
    Ok(Json(invoice))
}

/// POST `/proforma-invoices/{id}/reject`
async fn reject_proforma(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let invoice = state
        .proformas()
        .reject(ctx.company_id, id, ctx.user_id, &body.reason)
        .await?;
    info!(company_id = %ctx.company_id, invoice_id = %id, "Proforma invoice rejected");
    Ok(Json(invoice))
}

/// POST `/proforma-invoices/{id}/revise`
async fn revise_proforma(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let invoice = state
        .proformas()
        .revise(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, invoice_id = %id, version = invoice.version, "Proforma invoice revised");
    Ok(Json(invoice))
}

/// POST `/proforma-invoices/{id}/convert-to-commercial`
async fn convert_to_commercial(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let invoice = state
        .conversions()
        .proforma_to_commercial(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, invoice_id = %id, "Proforma converted to commercial invoice");
    Ok(Json(invoice))
}

/// POST `/proforma-invoices/{id}/convert-to-order`
async fn convert_to_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let order = state
        .conversions()
        .proforma_to_order(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, invoice_id = %id, order_id = %order.order.id, "Proforma converted to export order");
    Ok((StatusCode::CREATED, Json(order)))
}
