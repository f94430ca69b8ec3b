// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, SuperadminOnly},
    },
    models::auth::{UpdateStatusPayload, User},
};

// GET /users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "All sub-admins", body = Vec<User>),
        (status = 403, description = "Super-admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _caller: RequireRole<SuperadminOnly>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(app_state.company_service.list_users().await?))
}

// PUT /users/{id}/status
#[utoipa::path(
    put,
    path = "/users/{id}/status",
    tag = "Users",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = User),
        (status = 403, description = "Super-admin only"),
        (status = 404, description = "Sub-admin not found")
    ),
    params(("id" = Uuid, Path, description = "User id")),
    security(("api_jwt" = []))
)]
pub async fn set_user_status(
    State(app_state): State<AppState>,
    caller: RequireRole<SuperadminOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<User>, AppError> {
    if caller.user().id == id {
        return Err(AppError::BadRequest("You cannot change your own status.".into()));
    }
    let user = app_state.company_service.set_user_status(id, payload.status).await?;
    Ok(Json(user))
}

// GET /users/me
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    responses((status = 200, description = "The signed-in user", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
