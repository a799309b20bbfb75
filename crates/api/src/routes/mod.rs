//! API route definitions.

use axum::{Router, middleware};
use eximflow_db::repositories::{DocumentFilter, ListPage};
use eximflow_shared::types::{PageRequest, PageResponse};
use serde::Deserialize;

use crate::{
    AppState,
    middleware::{auth_middleware, tenancy_middleware},
};

pub mod brcs;
pub mod enquiries;
pub mod export_orders;
pub mod health;
pub mod maintenance;
pub mod numbering;
pub mod proformas;
pub mod purchase_orders;
pub mod quotes;
pub mod shipping_bills;
pub mod stats;

/// Routes that need a resolved company context.
pub(crate) fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(numbering::routes())
        .merge(enquiries::routes())
        .merge(quotes::routes())
        .merge(proformas::routes())
        .merge(export_orders::routes())
        .merge(purchase_orders::routes())
        .merge(shipping_bills::routes())
        .merge(brcs::routes())
        .merge(stats::routes())
        .merge(maintenance::routes())
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // The last layer added runs first: authenticate, then resolve the company.
    let protected = protected_routes()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenancy_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(health::routes()).merge(protected)
}

// ============================================================================
// Shared Request Types
// ============================================================================

/// Query string accepted by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only rows in this status.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl ListQuery {
    /// Status filter.
    #[must_use]
    pub fn filter(&self) -> DocumentFilter {
        DocumentFilter {
            status: self.status.clone(),
        }
    }

    /// Page window, with defaults for missing values.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Request body for reject actions.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Why the document was rejected.
    #[serde(default)]
    pub reason: String,
}

/// Request body for free-form status updates.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Target status.
    pub status: String,
}

/// Wraps a repository page into the response envelope.
pub(crate) fn paged<T>(page: ListPage<T>, request: &PageRequest) -> PageResponse<T> {
    PageResponse::new(page.items, request, page.total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
        middleware::Next,
    };
    use eximflow_core::tenancy::{CompanyRole, RequestContext};
    use eximflow_shared::{
        JwtConfig, JwtService, WorkflowConfig,
        types::{CompanyId, UserId},
    };
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AppState {
        AppState::new(
            DatabaseConnection::default(),
            JwtService::new(JwtConfig::default()),
            WorkflowConfig::default(),
        )
    }

    /// Protected routes with a fixed context standing in for the middleware.
    fn app_as(role: CompanyRole) -> Router {
        let ctx = RequestContext {
            user_id: UserId::new(),
            company_id: CompanyId::new(),
            role,
            is_super_admin: false,
        };
        protected_routes()
            .layer(middleware::from_fn(
                move |mut request: axum::extract::Request, next: Next| async move {
                    request.extensions_mut().insert(ctx);
                    next.run(request).await
                },
            ))
            .with_state(test_state())
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = crate::create_router(test_state());
        let (status, body) = send(app, "GET", "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], false);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = crate::create_router(test_state());
        let (status, body) = send(app, "GET", "/api/v1/quotes").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_bad_token_is_unauthorized() {
        let app = crate::create_router(test_state());
        let request = Request::builder()
            .uri("/api/v1/quotes")
            .header(AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_tenancy_without_claims_is_unauthorized() {
        let state = test_state();
        let app = protected_routes()
            .layer(middleware::from_fn_with_state(
                state.clone(),
                tenancy_middleware,
            ))
            .with_state(state);
        let (status, body) = send(app, "GET", "/quotes").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let request = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let response = crate::create_router(test_state())
            .oneshot(request)
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_pdf_without_renderer_is_unavailable() {
        let uri = format!("/proforma-invoices/{}/pdf", Uuid::new_v4());
        let (status, body) = send(app_as(CompanyRole::Staff), "GET", &uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_unknown_stats_type_is_rejected() {
        let (status, body) = send(app_as(CompanyRole::Viewer), "GET", "/stats/widgets").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_roles_gate_actions() {
        let uri = format!("/quotes/{}/approve", Uuid::new_v4());
        let (status, body) = send(app_as(CompanyRole::Staff), "POST", &uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");

        let uri = format!("/enquiries/{}/status", Uuid::new_v4());
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"status":"contacted"}"#))
            .unwrap();
        let response = app_as(CompanyRole::Viewer).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let (status, _) = send(app_as(CompanyRole::Manager), "POST", "/maintenance/sweep").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery {
            status: Some("draft".to_string()),
            page: None,
            per_page: Some(5),
        };
        assert_eq!(query.filter().status.as_deref(), Some("draft"));
        assert_eq!(query.page().page, 1);
        assert_eq!(query.page().per_page, 5);
    }
}
