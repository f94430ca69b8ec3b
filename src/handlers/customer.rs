// src/handlers/customer.rs

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
    models::{
        catalog::CatalogListQuery,
        customer::{CreateCustomerPayload, Customer, CustomerHistory, UpdateCustomerPayload},
    },
};

// GET /customer
#[utoipa::path(
    get,
    path = "/customer",
    tag = "Customer",
    params(CatalogListQuery),
    responses((status = 200, description = "Customers of the company", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<CatalogListQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = app_state
        .customer_service
        .list_customers(tenant.company_id(), query.include_inactive)
        .await?;
    Ok(Json(customers))
}

// GET /customer/{id}
#[utoipa::path(
    get,
    path = "/customer/{id}",
    tag = "Customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "The customer", body = Customer),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let customer = app_state.customer_service.get_customer(tenant.company_id(), id).await?;
    Ok(Json(customer))
}

// GET /customer/{id}/history
#[utoipa::path(
    get,
    path = "/customer/{id}/history",
    tag = "Customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Past orders, newest first", body = CustomerHistory),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn customer_history(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerHistory>, AppError> {
    let history = app_state.customer_service.history(tenant.company_id(), id).await?;
    Ok(Json(history))
}

// POST /customer
#[utoipa::path(
    post,
    path = "/customer",
    tag = "Customer",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid data")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let customer = app_state
        .customer_service
        .create_customer(tenant.company_id(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /customer/{id}
#[utoipa::path(
    put,
    path = "/customer/{id}",
    tag = "Customer",
    request_body = UpdateCustomerPayload,
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;
    let customer = app_state
        .customer_service
        .update_customer(tenant.company_id(), id, &payload)
        .await?;
    Ok(Json(customer))
}

// DELETE /customer/{id}
#[utoipa::path(
    delete,
    path = "/customer/{id}",
    tag = "Customer",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deactivated", body = Customer),
        (status = 400, description = "Already inactive"),
        (status = 404, description = "Not found in this company")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let customer = app_state
        .customer_service
        .delete_customer(tenant.company_id(), id)
        .await?;
    Ok(Json(customer))
}
