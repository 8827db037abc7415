// src/handlers/users.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::{AppJson, AppPath}},
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole},
    models::auth::{User, UserRole},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "The email address is invalid."))]
    #[schema(example = "sales@sunrise-solar.com.au")]
    pub email: String,

    #[validate(length(min = 1, max = 120, message = "Name is required."))]
    #[schema(example = "Alex Taylor")]
    pub name: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,

    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 120, message = "Name cannot be empty."))]
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub new_password: String,
}

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 403, description = "Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.user_service.list_users().await?;
    Ok(Json(users))
}

// GET /api/admin/users/{id}
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "Unknown user")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state.user_service.get_user(id).await?;
    Ok(Json(user))
}

// POST /api/admin/users
#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "Email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
    AppJson(payload): AppJson<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .user_service
        .create_user(&payload.email, &payload.name, &payload.password, payload.role)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

// PUT /api/admin/users/{id}
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid payload or self-deactivation"),
        (status = 404, description = "Unknown user")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    RequireRole(admin, _): RequireRole<AdminOnly>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state
        .user_service
        .update_user(
            admin.id,
            id,
            payload.name.as_deref(),
            payload.role,
            payload.is_active,
        )
        .await?;

    Ok(Json(user))
}

// PUT /api/admin/users/{id}/password
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/password",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Password reset"),
        (status = 404, description = "Unknown user")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ResetPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state
        .user_service
        .reset_password(id, &payload.new_password)
        .await?;

    Ok(Json(json!({ "success": true })))
}
