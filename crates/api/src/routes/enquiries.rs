//! Enquiry routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use eximflow_db::repositories::{CreateEnquiryInput, EnquiryConversionInput};
use tracing::info;
use uuid::Uuid;

use super::{ListQuery, StatusRequest, paged};
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::Tenant,
};

/// Creates the enquiry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/enquiries", get(list_enquiries).post(create_enquiry))
        .route("/enquiries/{id}", get(get_enquiry))
        .route("/enquiries/{id}/status", post(update_status))
        .route("/enquiries/{id}/convert", post(convert_to_quote))
}

/// POST `/enquiries`
async fn create_enquiry(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppJson(body): AppJson<CreateEnquiryInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state
        .enquiries()
        .create(ctx.company_id, ctx.user_id, body)
        .await?;
    info!(
        company_id = %ctx.company_id,
        enquiry_id = %detail.enquiry.id,
        number = %detail.enquiry.enquiry_number,
        "Enquiry created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET `/enquiries`
async fn list_enquiries(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page();
    let rows = state
        .enquiries()
        .list(ctx.company_id, &query.filter(), &page)
        .await?;
    Ok(Json(paged(rows, &page)))
}

/// GET `/enquiries/{id}`
async fn get_enquiry(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.enquiries().get(ctx.company_id, id).await?))
}

/// POST `/enquiries/{id}/status` - Move an open enquiry to another status.
async fn update_status(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let enquiry = state
        .enquiries()
        .update_status(ctx.company_id, id, ctx.user_id, &body.status)
        .await?;
    info!(company_id = %ctx.company_id, enquiry_id = %id, status = %enquiry.status, "Enquiry status updated");
    Ok(Json(enquiry))
}

/// POST `/enquiries/{id}/convert` - Turn the enquiry into a draft quote.
async fn convert_to_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<EnquiryConversionInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let quote = state
        .conversions()
        .enquiry_to_quote(ctx.company_id, id, ctx.user_id, body)
        .await?;
    info!(company_id = %ctx.company_id, enquiry_id = %id, quote_id = %quote.quote.id, "Enquiry converted to quote");
    Ok((StatusCode::CREATED, Json(quote)))
}
