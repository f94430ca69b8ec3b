// src/handlers/product.rs

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
        CatalogListQuery, CreateProductPayload, LowStockQuery, Product, UpdateProductPayload,
    },
};

// GET /product
#[utoipa::path(
    get,
    path = "/product",
    tag = "Product",
    params(CatalogListQuery),
    responses((status = 200, description = "Products of the company", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = app_state
        .catalog_service
        .list_products(tenant.company_id(), query.include_inactive)
        .await?;
    Ok(Json(products))
}

// GET /product/low-stock
#[utoipa::path(
    get,
    path = "/product/low-stock",
    tag = "Product",
    params(LowStockQuery),
    responses((status = 200, description = "Active products at or below the threshold", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = app_state
        .catalog_service
        .low_stock(tenant.company_id(), query.threshold)
        .await?;
    Ok(Json(products))
}

// GET /product/{id}
#[utoipa::path(
    get,
    path = "/product/{id}",
    tag = "Product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = app_state.catalog_service.get_product(tenant.company_id(), id).await?;
    Ok(Json(product))
}

// POST /product
#[utoipa::path(
    post,
    path = "/product",
    tag = "Product",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid data or duplicate name"),
        (status = 403, description = "Company is inactive")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state
        .catalog_service
        .create_product(tenant.company_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /product/{id}
#[utoipa::path(
    put,
    path = "/product/{id}",
    tag = "Product",
    request_body = UpdateProductPayload,
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;
    let product = app_state
        .catalog_service
        .update_product(tenant.company_id(), id, &payload)
        .await?;
    Ok(Json(product))
}

// DELETE /product/{id}
#[utoipa::path(
    delete,
    path = "/product/{id}",
    tag = "Product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deactivated", body = Product),
        (status = 400, description = "Already inactive"),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = app_state
        .catalog_service
        .delete_product(tenant.company_id(), id)
        .await?;
    Ok(Json(product))
}
