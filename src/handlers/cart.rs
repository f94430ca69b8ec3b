// src/handlers/cart.rs

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::cart::{PendingCartResponse, SaveCartPayload, SaveCartResponse},
};

// POST /cart/save
#[utoipa::path(
    post,
    path = "/cart/save",
    tag = "Cart",
    request_body = SaveCartPayload,
    responses(
        (status = 200, description = "Draft saved, cleared, or already empty", body = SaveCartResponse),
        (status = 400, description = "Invalid data")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_cart(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<SaveCartPayload>,
) -> Result<Json<SaveCartResponse>, AppError> {
    payload.validate()?;
    let response = app_state
        .cart_service
        .save_cart(tenant.company_id(), &payload)
        .await?;
    Ok(Json(response))
}

// GET /cart/pending/{id}
#[utoipa::path(
    get,
    path = "/cart/pending/{id}",
    tag = "Cart",
    params(("id" = String, Path, description = "Client cart id")),
    responses((status = 200, description = "The draft, or `pending: false`", body = PendingCartResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_pending_cart(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<String>,
) -> Result<Json<PendingCartResponse>, AppError> {
    let response = app_state
        .cart_service
        .get_pending_cart(tenant.company_id(), &id)
        .await?;
    Ok(Json(response))
}
