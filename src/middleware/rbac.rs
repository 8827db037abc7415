// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::{User, UserRole},
};

/// A named set of roles allowed through a route.
pub trait RoleGuard: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
    fn name() -> &'static str;
}

/// Extractor that yields the caller when their role is in `T::allowed()`.
pub struct RequireRole<T>(pub User, pub PhantomData<T>);

pub fn check_role<T: RoleGuard>(user: &User) -> Result<(), AppError> {
    if T::allowed().contains(&user.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, role = ?user.role, guard = T::name(), "Access denied");
        Err(AppError::Forbidden(format!(
            "This action requires {} access.",
            T::name()
        )))
    }
}

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleGuard,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        check_role::<T>(&user)?;
        Ok(RequireRole(user, PhantomData))
    }
}

// ---
// ROLE SETS
// ---

pub struct AdminOnly;
impl RoleGuard for AdminOnly {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin] }
    fn name() -> &'static str { "admin" }
}

pub struct AdminOrManager;
impl RoleGuard for AdminOrManager {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Manager] }
    fn name() -> &'static str { "manager" }
}

pub struct SalesAccess;
impl RoleGuard for SalesAccess {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Manager, UserRole::Sales] }
    fn name() -> &'static str { "sales" }
}

pub struct FieldAccess;
impl RoleGuard for FieldAccess {
    fn allowed() -> &'static [UserRole] { &[UserRole::Admin, UserRole::Manager, UserRole::Installer] }
    fn name() -> &'static str { "installer" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".into(),
            name: "Someone".into(),
            password_hash: String::new(),
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_sets() {
        assert!(check_role::<AdminOnly>(&user(UserRole::Admin)).is_ok());
        assert!(check_role::<AdminOnly>(&user(UserRole::Manager)).is_err());

        assert!(check_role::<SalesAccess>(&user(UserRole::Sales)).is_ok());
        assert!(matches!(
            check_role::<SalesAccess>(&user(UserRole::Installer)),
            Err(AppError::Forbidden(_))
        ));

        assert!(check_role::<FieldAccess>(&user(UserRole::Installer)).is_ok());
        assert!(check_role::<AdminOrManager>(&user(UserRole::Sales)).is_err());
    }
}
