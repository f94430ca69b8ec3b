// src/handlers/order.rs

use axum::{
    extract::{Path, State},
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
    models::order::{
        MonthlyOrdersPayload, OrderDetail, OrderStats, OrderSummary, PlaceOrderPayload,
        PlaceOrderResponse,
    },
};

// POST /order/place-order
#[utoipa::path(
    post,
    path = "/order/place-order",
    tag = "Order",
    request_body = PlaceOrderPayload,
    responses(
        (status = 201, description = "Order placed and invoice stored", body = PlaceOrderResponse),
        (status = 400, description = "Missing fields, insufficient stock or totals mismatch"),
        (status = 403, description = "Company is inactive"),
        (status = 404, description = "Customer or item not found"),
        (status = 500, description = "Order placed but the invoice failed; retry via /order/{id}/invoice")
    ),
    security(("api_jwt" = []))
)]
pub async fn place_order(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<PlaceOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state
        .order_service
        .place_order(&tenant.company, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// POST /order/{id}/invoice
#[utoipa::path(
    post,
    path = "/order/{id}/invoice",
    tag = "Order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Invoice available", body = PlaceOrderResponse),
        (status = 404, description = "Not found in this company"),
        (status = 500, description = "Invoice generation failed again")
    ),
    security(("api_jwt" = []))
)]
pub async fn regenerate_invoice(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaceOrderResponse>, AppError> {
    let response = app_state
        .order_service
        .regenerate_invoice(&tenant.company, id)
        .await?;
    Ok(Json(response))
}

// GET /order/all
#[utoipa::path(
    get,
    path = "/order/all",
    tag = "Order",
    responses((status = 200, description = "Orders, newest first", body = Vec<OrderSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    Ok(Json(app_state.order_service.list_orders(tenant.company_id()).await?))
}

// GET /order/{id}
#[utoipa::path(
    get,
    path = "/order/{id}",
    tag = "Order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order with its lines", body = OrderDetail),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = app_state.order_service.get_order(tenant.company_id(), id).await?;
    Ok(Json(order))
}

// GET /order/stats
#[utoipa::path(
    get,
    path = "/order/stats",
    tag = "Order",
    responses((status = 200, description = "Dashboard counters", body = OrderStats)),
    security(("api_jwt" = []))
)]
pub async fn order_stats(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<OrderStats>, AppError> {
    Ok(Json(app_state.analytics_service.order_stats(tenant.company_id()).await?))
}

// POST /order/monthly-orders
#[utoipa::path(
    post,
    path = "/order/monthly-orders",
    tag = "Order",
    request_body = MonthlyOrdersPayload,
    responses(
        (status = 200, description = "Orders placed in the given month", body = Vec<OrderSummary>),
        (status = 400, description = "Invalid month or year")
    ),
    security(("api_jwt" = []))
)]
pub async fn monthly_orders(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<MonthlyOrdersPayload>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    payload.validate()?;
    let orders = app_state
        .analytics_service
        .monthly_orders(tenant.company_id(), &payload)
        .await?;
    Ok(Json(orders))
}
