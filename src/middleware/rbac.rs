// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{Role, User},
};

/// A fixed allowlist of roles.
pub trait RoleSet: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
    fn describe() -> &'static str;
}

/// Extractor that rejects the request with 403 unless the caller's role is in `R`.
pub struct RequireRole<R>(pub User, PhantomData<R>);

impl<R> RequireRole<R> {
    pub fn user(&self) -> &User {
        &self.0
    }
}

impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        check_role::<R>(user.role)?;
        Ok(RequireRole(user, PhantomData))
    }
}

fn check_role<R: RoleSet>(role: Role) -> Result<(), AppError> {
    if R::allows(role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "This action is restricted to {}.",
            R::describe()
        )))
    }
}

// ---
// Allowlists
// ---

pub struct SuperadminOnly;
impl RoleSet for SuperadminOnly {
    fn allows(role: Role) -> bool {
        role == Role::Superadmin
    }
    fn describe() -> &'static str {
        "super-admins"
    }
}

pub struct SubadminOnly;
impl RoleSet for SubadminOnly {
    fn allows(role: Role) -> bool {
        role == Role::Subadmin
    }
    fn describe() -> &'static str {
        "sub-admins"
    }
}

pub struct AnyRole;
impl RoleSet for AnyRole {
    fn allows(_: Role) -> bool {
        true
    }
    fn describe() -> &'static str {
        "signed-in users"
    }
}
