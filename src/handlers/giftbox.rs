// src/handlers/giftbox.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::catalog::{
        CatalogListQuery, CreateGiftBoxPayload, GiftBox, GiftBoxDetail, UpdateGiftBoxPayload,
    },
};

// GET /giftbox
#[utoipa::path(
    get,
    path = "/giftbox",
    tag = "Gift box",
    params(CatalogListQuery),
    responses((status = 200, description = "Gift boxes with their contents", body = Vec<GiftBoxDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_gift_boxes(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<Vec<GiftBoxDetail>>, AppError> {
    let boxes = app_state
        .catalog_service
        .list_gift_boxes(tenant.company_id(), query.include_inactive)
        .await?;
    Ok(Json(boxes))
}

// GET /giftbox/{id}
#[utoipa::path(
    get,
    path = "/giftbox/{id}",
    tag = "Gift box",
    params(("id" = Uuid, Path, description = "Gift box id")),
    responses(
        (status = 200, description = "The gift box", body = GiftBoxDetail),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_gift_box(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<GiftBoxDetail>, AppError> {
    let gift_box = app_state.catalog_service.get_gift_box(tenant.company_id(), id).await?;
    Ok(Json(gift_box))
}

// POST /giftbox
#[utoipa::path(
    post,
    path = "/giftbox",
    tag = "Gift box",
    request_body = CreateGiftBoxPayload,
    responses(
        (status = 201, description = "Gift box created", body = GiftBoxDetail),
        (status = 400, description = "Invalid data, duplicate name or foreign product")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_gift_box(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateGiftBoxPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let gift_box = app_state
        .catalog_service
        .create_gift_box(tenant.company_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(gift_box)))
}

// PUT /giftbox/{id}
#[utoipa::path(
    put,
    path = "/giftbox/{id}",
    tag = "Gift box",
    request_body = UpdateGiftBoxPayload,
    params(("id" = Uuid, Path, description = "Gift box id")),
    responses(
        (status = 200, description = "Gift box updated", body = GiftBoxDetail),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_gift_box(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGiftBoxPayload>,
) -> Result<Json<GiftBoxDetail>, AppError> {
    payload.validate()?;
    let gift_box = app_state
        .catalog_service
        .update_gift_box(tenant.company_id(), id, &payload)
        .await?;
    Ok(Json(gift_box))
}

// DELETE /giftbox/{id}
#[utoipa::path(
    delete,
    path = "/giftbox/{id}",
    tag = "Gift box",
    params(("id" = Uuid, Path, description = "Gift box id")),
    responses(
        (status = 200, description = "Gift box deactivated", body = GiftBox),
        (status = 400, description = "Already inactive"),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_gift_box(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<GiftBox>, AppError> {
    let gift_box = app_state
        .catalog_service
        .delete_gift_box(tenant.company_id(), id)
        .await?;
    Ok(Json(gift_box))
}
