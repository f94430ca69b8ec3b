// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{auth::Role, company::Company},
};

// Lets a super-admin act on a specific tenant.
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// The company every tenant-scoped query of this request is filtered by.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub company: Company,
}

impl TenantContext {
    pub fn company_id(&self) -> Uuid {
        self.company.id
    }
}

// Must run after `auth_guard`.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let AuthenticatedUser(user) = request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or(AppError::InvalidToken)?;

    let company = match user.role {
        Role::Subadmin => {
            let company_id = user
                .company_id
                .ok_or_else(|| AppError::NotFound("Company".into()))?;
            let company = app_state.company_service.get_company(company_id).await?;
            if !company.status {
                tracing::warn!(%company_id, user_id = %user.id, "Blocked request for inactive company");
                return Err(AppError::CompanyInactive);
            }
            company
        }
        Role::Superadmin => {
            let company_id = tenant_header(request.headers())?;
            app_state.company_service.get_company(company_id).await?
        }
    };

    request.extensions_mut().insert(TenantContext { company });
    Ok(next.run(request).await)
}

fn tenant_header(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get(TENANT_ID_HEADER)
        .ok_or_else(|| AppError::BadRequest("The x-tenant-id header is required.".into()))?;
    let raw = raw
        .to_str()
        .map_err(|_| AppError::BadRequest("The x-tenant-id header contains invalid characters.".into()))?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest("The x-tenant-id header is not a valid UUID.".into()))
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| AppError::BadRequest("Company context not found.".into()))
    }
}
