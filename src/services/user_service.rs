// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{User, UserRole},
    services::auth::{hash_password, normalize_email},
};

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.repo.list().await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let email = normalize_email(email);
        let password_hash = hash_password(password).await?;
        let user = self.repo.create_user(&email, name, &password_hash, role).await?;
        tracing::info!(user_id = %user.id, role = ?role, "User created");
        Ok(user)
    }

    /// `actor_id` is the admin making the change; they cannot disable themselves.
    pub async fn update_user(
        &self,
        actor_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> Result<User, AppError> {
        if actor_id == id && is_active == Some(false) {
            return Err(AppError::BadRequest(
                "You cannot deactivate your own account.".into(),
            ));
        }

        self.repo
            .update_user(id, name, role, is_active)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn reset_password(&self, id: Uuid, new_password: &str) -> Result<(), AppError> {
        let password_hash = hash_password(new_password).await?;
        if !self.repo.update_password(id, &password_hash).await? {
            return Err(AppError::UserNotFound);
        }
        tracing::info!(user_id = %id, "Password reset");
        Ok(())
    }
}
