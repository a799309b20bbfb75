//! Quote routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use eximflow_db::repositories::CreateQuoteInput;
use tracing::info;
use uuid::Uuid;

use super::{ListQuery, RejectRequest, paged};
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::Tenant,
};

/// Creates the quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_quotes).post(create_quote))
        .route("/quotes/{id}", get(get_quote))
        .route("/quotes/{id}/submit", post(submit_quote))
        .route("/quotes/{id}/approve", post(approve_quote))
        .route("/quotes/{id}/reject", post(reject_quote))
        .route("/quotes/{id}/send", post(send_quote))
        .route("/quotes/{id}/revise", post(revise_quote))
        .route("/quotes/{id}/convert", post(convert_to_proforma))
}

/// POST `/quotes`
async fn create_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppJson(body): AppJson<CreateQuoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let detail = state.quotes().create(ctx.company_id, ctx.user_id, body).await?;
    info!(
        company_id = %ctx.company_id,
        quote_id = %detail.quote.id,
        number = %detail.quote.quote_number,
        "Quote created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET `/quotes`
async fn list_quotes(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page();
    let rows = state
        .quotes()
        .list(ctx.company_id, &query.filter(), &page)
        .await?;
    Ok(Json(paged(rows, &page)))
}

/// GET `/quotes/{id}`
async fn get_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.quotes().get(ctx.company_id, id).await?))
}

/// POST `/quotes/{id}/submit`
async fn submit_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let quote = state.quotes().submit(ctx.company_id, id, ctx.user_id).await?;
    info!(company_id = %ctx.company_id, quote_id = %id, "Quote submitted");
    Ok(Json(quote))
}

/// POST `/quotes/{id}/approve`
async fn approve_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let quote = state.quotes().approve(ctx.company_id, id, ctx.user_id).await?;
    info!(company_id = %ctx.company_id, quote_id = %id, approver = %ctx.user_id, "Quote approved");
    Ok(Json(quote))
}

/// POST `/quotes/{id}/reject`
async fn reject_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_approve()?;
    let quote = state
        .quotes()
        .reject(ctx.company_id, id, ctx.user_id, &body.reason)
        .await?;
    info!(company_id = %ctx.company_id, quote_id = %id, "Quote rejected");
    Ok(Json(quote))
}

/// POST `/quotes/{id}/send` - Mark an approved quote as sent to the buyer.
async fn send_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let quote = state.quotes().send(ctx.company_id, id, ctx.user_id).await?;
    info!(company_id = %ctx.company_id, quote_id = %id, "Quote sent");
    Ok(Json(quote))
}

/// POST `/quotes/{id}/revise` - Reopen a rejected quote as a new version.
async fn revise_quote(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let quote = state.quotes().revise(ctx.company_id, id, ctx.user_id).await?;
    info!(company_id = %ctx.company_id, quote_id = %id, version = quote.version, "Quote revised");
    Ok(Json(quote))
}

/// POST `/quotes/{id}/convert` - Create a proforma invoice from the quote.
async fn convert_to_proforma(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_edit()?;
    let invoice = state
        .conversions()
        .quote_to_proforma(ctx.company_id, id, ctx.user_id)
        .await?;
    info!(company_id = %ctx.company_id, quote_id = %id, invoice_id = %invoice.invoice.id, "Quote converted to proforma invoice");
    Ok((StatusCode::CREATED, Json(invoice)))
}
