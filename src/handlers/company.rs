// src/handlers/company.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        rbac::{RequireRole, SuperadminOnly},
        tenancy::TenantContext,
    },
    models::{
        auth::UpdateStatusPayload,
        company::{Company, CompanyOverview, UpdateCompanyPayload},
    },
};

// GET /company
#[utoipa::path(
    get,
    path = "/company",
    tag = "Company",
    responses((status = 200, description = "Current company profile", body = Company)),
    params(("x-tenant-id" = Option<Uuid>, Header, description = "Target company (super-admin only)")),
    security(("api_jwt" = []))
)]
pub async fn get_company(tenant: TenantContext) -> Json<Company> {
    Json(tenant.company)
}

// PUT /company
#[utoipa::path(
    put,
    path = "/company",
    tag = "Company",
    request_body = UpdateCompanyPayload,
    responses(
        (status = 200, description = "Profile updated", body = Company),
        (status = 400, description = "Invalid data")
    ),
    params(("x-tenant-id" = Option<Uuid>, Header, description = "Target company (super-admin only)")),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    payload.validate()?;
    let company = app_state
        .company_service
        .update_company(tenant.company_id(), &payload)
        .await?;
    Ok(Json(company))
}

// GET /company/all
#[utoipa::path(
    get,
    path = "/company/all",
    tag = "Company",
    responses(
        (status = 200, description = "Every company with its admin", body = Vec<CompanyOverview>),
        (status = 403, description = "Super-admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    _caller: RequireRole<SuperadminOnly>,
) -> Result<Json<Vec<CompanyOverview>>, AppError> {
    Ok(Json(app_state.company_service.list_companies().await?))
}

// PUT /company/{id}/status
#[utoipa::path(
    put,
    path = "/company/{id}/status",
    tag = "Company",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Company),
        (status = 403, description = "Super-admin only"),
        (status = 404, description = "Company not found")
    ),
    params(("id" = Uuid, Path, description = "Company id")),
    security(("api_jwt" = []))
)]
pub async fn set_company_status(
    State(app_state): State<AppState>,
    _caller: RequireRole<SuperadminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<Company>, AppError> {
    let company = app_state
        .company_service
        .set_company_status(id, payload.status)
        .await?;
    Ok(Json(company))
}
