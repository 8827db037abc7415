// src/handlers/public.rs
//
// Unauthenticated reads for the marketing site.

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{error::AppError, extract::AppPath},
    config::AppState,
    models::content::{AboutPage, BlogPost, HeroSlide, Testimonial},
};

// GET /api/public/blog
#[utoipa::path(
    get,
    path = "/api/public/blog",
    tag = "Public",
    responses((status = 200, description = "Published posts, newest first", body = Vec<BlogPost>))
)]
pub async fn list_published_posts(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let posts = app_state
        .content_service
        .list_posts(&app_state.db_pool, true)
        .await?;
    Ok(Json(posts))
}

// GET /api/public/blog/{slug}
#[utoipa::path(
    get,
    path = "/api/public/blog/{slug}",
    tag = "Public",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Published post", body = BlogPost),
        (status = 404, description = "No published post with this slug")
    )
)]
pub async fn get_published_post(
    State(app_state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = app_state
        .content_service
        .get_published_post(&app_state.db_pool, &slug)
        .await?;
    Ok(Json(post))
}

// GET /api/public/testimonials
#[utoipa::path(
    get,
    path = "/api/public/testimonials",
    tag = "Public",
    responses((status = 200, description = "Approved testimonials, featured first", body = Vec<Testimonial>))
)]
pub async fn list_approved_testimonials(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let testimonials = app_state
        .content_service
        .list_testimonials(&app_state.db_pool, true)
        .await?;
    Ok(Json(testimonials))
}

// GET /api/public/hero-slides
#[utoipa::path(
    get,
    path = "/api/public/hero-slides",
    tag = "Public",
    responses((status = 200, description = "Active slides in carousel order", body = Vec<HeroSlide>))
)]
pub async fn list_active_slides(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let slides = app_state
        .content_service
        .list_slides(&app_state.db_pool, true)
        .await?;
    Ok(Json(slides))
}

// GET /api/public/about
#[utoipa::path(
    get,
    path = "/api/public/about",
    tag = "Public",
    responses((status = 200, description = "About page", body = AboutPage))
)]
pub async fn get_public_about(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let page = app_state.content_service.get_about(&app_state.db_pool).await?;
    Ok(Json(page))
}
