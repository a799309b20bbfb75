//! Periodic sweeps, triggered by an external scheduler.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{AppState, error::ApiError, middleware::Tenant};

/// Creates the maintenance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/maintenance/sweep", post(sweep))
}

/// Rows touched by a sweep.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// Quotes moved to `expired`.
    pub expired_quotes: u64,
    /// BRCs whose overdue flag changed.
    pub overdue_flags_changed: u64,
}

/// POST `/maintenance/sweep` - Expire stale quotes and refresh BRC overdue flags.
async fn sweep(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_admin()?;
    let today = Utc::now().date_naive();

    let expired_quotes = state
        .quotes()
        .expire_stale(Some(ctx.company_id), today)
        .await?;
    let overdue_flags_changed = state
        .brcs()
        .flag_overdue(Some(ctx.company_id), today)
        .await?;

    info!(
        company_id = %ctx.company_id,
        expired_quotes,
        overdue_flags_changed,
        "Maintenance sweep finished"
    );
    Ok(Json(SweepResponse {
        expired_quotes,
        overdue_flags_changed,
    }))
}
