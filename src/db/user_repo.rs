// src/db/user_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

// All access to the `users` table.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                id, email, name, password_hash, role as "role: UserRole",
                is_active, last_login_at, created_at, updated_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
            email
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                id, email, name, password_hash, role as "role: UserRole",
                is_active, last_login_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as!(
            User,
            r#"
            SELECT
                id, email, name, password_hash, role as "role: UserRole",
                is_active, last_login_at, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar!(r#"SELECT COUNT(*) as "count!" FROM users"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Expects `email` already normalised; `lower(email)` is unique.
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        sqlx::query_as!(
            User,
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING
                id, email, name, password_hash, role as "role: UserRole",
                is_active, last_login_at, created_at, updated_at
            "#,
            email,
            name,
            password_hash,
            role as UserRole
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "This email is already in use."))
    }

    /// Partial update: `None` keeps the stored value.
    pub async fn update_user(
        &self,
        id: Uuid,
        name: Option<&str>,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as!(
            User,
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, email, name, password_hash, role as "role: UserRole",
                is_active, last_login_at, created_at, updated_at
            "#,
            id,
            name,
            role as Option<UserRole>,
            is_active
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query!(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            id,
            password_hash
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query!("UPDATE users SET last_login_at = NOW() WHERE id = $1", id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
