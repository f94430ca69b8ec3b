// src/handlers/analytics.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::analytics::{AnalyticsQuery, AnalyticsResponse, ExportRow, RealtimeSnapshot},
};

// GET /analytics/advanced
#[utoipa::path(
    get,
    path = "/analytics/advanced",
    tag = "Analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Dashboard for the window; `fallback` is set when only legacy stats could be computed", body = AnalyticsResponse),
        (status = 400, description = "Invalid date range")
    ),
    security(("api_jwt" = []))
)]
pub async fn advanced(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let response = app_state
        .analytics_service
        .advanced(tenant.company_id(), &query)
        .await?;
    Ok(Json(response))
}

// GET /analytics/export
#[utoipa::path(
    get,
    path = "/analytics/export",
    tag = "Analytics",
    params(AnalyticsQuery),
    responses((status = 200, description = "One row per order in the window", body = Vec<ExportRow>)),
    security(("api_jwt" = []))
)]
pub async fn export(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<ExportRow>>, AppError> {
    let rows = app_state
        .analytics_service
        .export(tenant.company_id(), &query)
        .await?;
    Ok(Json(rows))
}

// GET /analytics/realtime
#[utoipa::path(
    get,
    path = "/analytics/realtime",
    tag = "Analytics",
    responses((status = 200, description = "Today's activity", body = RealtimeSnapshot)),
    security(("api_jwt" = []))
)]
pub async fn realtime(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<RealtimeSnapshot>, AppError> {
    Ok(Json(app_state.analytics_service.realtime(tenant.company_id()).await?))
}
