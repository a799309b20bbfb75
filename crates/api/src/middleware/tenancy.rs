//! Resolves the authenticated user to a company context.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use eximflow_core::tenancy::{Principal, RequestContext, TenancyGate};
use eximflow_shared::{
    Claims,
    types::{CompanyId, UserId},
};

use crate::{AppState, error::ApiError};

/// Builds the principal a set of token claims describes.
fn principal_from(claims: &Claims) -> Principal {
    Principal {
        user_id: UserId::from_uuid(claims.user_id()),
        company_hint: Some(CompanyId::from_uuid(claims.company_id())),
        is_super_admin: claims.super_admin,
    }
}

/// Tenancy middleware. Must run after [`super::auth_middleware`].
///
/// Looks up the caller's membership in the company named by the token and
/// stores the resulting [`RequestContext`] in request extensions.
pub async fn tenancy_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = request.extensions().get::<Claims>().map(principal_from);

    let membership = match &principal {
        Some(p) => match p.company_hint {
            Some(company_id) => match state.companies().membership(p.user_id, company_id).await {
                Ok(m) => m,
                Err(e) => return ApiError::from(e).into_response(),
            },
            None => None,
        },
        None => None,
    };

    match TenancyGate::resolve(principal.as_ref(), membership) {
        Ok(ctx) => {
            tracing::debug!(
                user_id = %ctx.user_id,
                company_id = %ctx.company_id,
                role = %ctx.role,
                "Resolved request context"
            );
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the resolved company context.
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub RequestContext);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .copied()
            .map(Tenant)
            .ok_or_else(|| ApiError::from(eximflow_core::WorkflowError::Unauthorized))
    }
}
