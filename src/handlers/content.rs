// src/handlers/content.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::{AppJson, AppPath}},
    config::AppState,
    middleware::rbac::{AdminOrManager, RequireRole},
    models::content::{
        AboutPage, BlogPost, BlogPostDraft, HeroSlide, HeroSlideDraft, PostStatus, Testimonial,
        TestimonialDraft,
    },
};

// =============================================================================
//  BLOG
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPayload {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    #[schema(example = "How many panels does a 6.6kW system need?")]
    pub title: String,

    /// Derived from the title when empty.
    pub slug: Option<String>,

    #[validate(length(max = 500, message = "Excerpt is limited to 500 characters."))]
    pub excerpt: Option<String>,

    #[validate(length(min = 1, message = "Content is required."))]
    pub content: String,

    #[validate(url(message = "Cover image must be a URL."))]
    pub cover_image_url: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_post_status")]
    pub status: PostStatus,
}

fn default_post_status() -> PostStatus {
    PostStatus::Draft
}

impl From<BlogPostPayload> for BlogPostDraft {
    fn from(p: BlogPostPayload) -> Self {
        BlogPostDraft {
            title: p.title,
            slug: p.slug.unwrap_or_default(),
            excerpt: p.excerpt,
            content: p.content,
            cover_image_url: p.cover_image_url,
            category: p.category,
            tags: p.tags,
            status: p.status,
        }
    }
}

// GET /api/admin/website/blog
#[utoipa::path(
    get,
    path = "/api/admin/website/blog",
    tag = "Website",
    responses((status = 200, description = "Every post, drafts included", body = Vec<BlogPost>)),
    security(("api_jwt" = []))
)]
pub async fn list_posts(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
) -> Result<impl IntoResponse, AppError> {
    let posts = app_state
        .content_service
        .list_posts(&app_state.db_pool, false)
        .await?;
    Ok(Json(posts))
}

// POST /api/admin/website/blog
#[utoipa::path(
    post,
    path = "/api/admin/website/blog",
    tag = "Website",
    request_body = BlogPostPayload,
    responses(
        (status = 201, description = "Post created", body = BlogPost),
        (status = 409, description = "Slug already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_post(
    State(app_state): State<AppState>,
    RequireRole(editor, _): RequireRole<AdminOrManager>,
    AppJson(payload): AppJson<BlogPostPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let post = app_state
        .content_service
        .create_post(&app_state.db_pool, payload.into(), editor.id)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

// GET /api/admin/website/blog/{id}
#[utoipa::path(
    get,
    path = "/api/admin/website/blog/{id}",
    tag = "Website",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = BlogPost),
        (status = 404, description = "Unknown post")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_post(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let post = app_state.content_service.get_post(&app_state.db_pool, id).await?;
    Ok(Json(post))
}

// PUT /api/admin/website/blog/{id}
#[utoipa::path(
    put,
    path = "/api/admin/website/blog/{id}",
    tag = "Website",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = BlogPostPayload,
    responses(
        (status = 200, description = "Post updated", body = BlogPost),
        (status = 404, description = "Unknown post"),
        (status = 409, description = "Slug already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_post(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<BlogPostPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let post = app_state
        .content_service
        .update_post(&app_state.db_pool, id, payload.into())
        .await?;

    Ok(Json(post))
}

// DELETE /api/admin/website/blog/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/website/blog/{id}",
    tag = "Website",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Unknown post")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_post(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.content_service.delete_post(&app_state.db_pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  TESTIMONIALS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialPayload {
    #[validate(length(min = 1, max = 120, message = "Customer name is required."))]
    #[schema(example = "Karen W.")]
    pub customer_name: String,
    pub location: Option<String>,

    #[validate(range(min = 1, max = 5, message = "Rating goes from 1 to 5."))]
    #[schema(example = 5)]
    pub rating: i16,

    #[validate(length(min = 1, message = "Content is required."))]
    pub content: String,
    pub system_size_kw: Option<Decimal>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_approved: bool,
}

impl From<TestimonialPayload> for TestimonialDraft {
    fn from(p: TestimonialPayload) -> Self {
        TestimonialDraft {
            customer_name: p.customer_name,
            location: p.location,
            rating: p.rating,
            content: p.content,
            system_size_kw: p.system_size_kw,
            image_url: p.image_url,
            is_featured: p.is_featured,
            is_approved: p.is_approved,
        }
    }
}

// GET /api/admin/website/testimonials
#[utoipa::path(
    get,
    path = "/api/admin/website/testimonials",
    tag = "Website",
    responses((status = 200, description = "Every testimonial", body = Vec<Testimonial>)),
    security(("api_jwt" = []))
)]
pub async fn list_testimonials(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
) -> Result<impl IntoResponse, AppError> {
    let testimonials = app_state
        .content_service
        .list_testimonials(&app_state.db_pool, false)
        .await?;
    Ok(Json(testimonials))
}

// POST /api/admin/website/testimonials
#[utoipa::path(
    post,
    path = "/api/admin/website/testimonials",
    tag = "Website",
    request_body = TestimonialPayload,
    responses((status = 201, description = "Testimonial created", body = Testimonial)),
    security(("api_jwt" = []))
)]
pub async fn create_testimonial(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppJson(payload): AppJson<TestimonialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let testimonial = app_state
        .content_service
        .create_testimonial(&app_state.db_pool, &payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(testimonial)))
}

// PUT /api/admin/website/testimonials/{id}
#[utoipa::path(
    put,
    path = "/api/admin/website/testimonials/{id}",
    tag = "Website",
    params(("id" = Uuid, Path, description = "Testimonial id")),
    request_body = TestimonialPayload,
    responses(
        (status = 200, description = "Testimonial updated", body = Testimonial),
        (status = 404, description = "Unknown testimonial")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_testimonial(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TestimonialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let testimonial = app_state
        .content_service
        .update_testimonial(&app_state.db_pool, id, &payload.into())
        .await?;

    Ok(Json(testimonial))
}

// DELETE /api/admin/website/testimonials/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/website/testimonials/{id}",
    tag = "Website",
    params(("id" = Uuid, Path, description = "Testimonial id")),
    responses(
        (status = 204, description = "Testimonial deleted"),
        (status = 404, description = "Unknown testimonial")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_testimonial(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .content_service
        .delete_testimonial(&app_state.db_pool, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  HERO SLIDES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlidePayload {
    #[validate(length(min = 1, max = 150, message = "Title is required."))]
    #[schema(example = "Battery rebates are here")]
    pub title: String,
    pub subtitle: Option<String>,

    #[validate(length(min = 1, message = "Image is required."))]
    pub image_url: String,

    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<HeroSlidePayload> for HeroSlideDraft {
    fn from(p: HeroSlidePayload) -> Self {
        HeroSlideDraft {
            title: p.title,
            subtitle: p.subtitle,
            image_url: p.image_url,
            cta_label: p.cta_label,
            cta_url: p.cta_url,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSlidesPayload {
    /// Slide ids in display order.
    #[validate(length(min = 1, message = "At least one slide id is required."))]
    pub slide_ids: Vec<Uuid>,
}

// GET /api/admin/website/hero-slides
#[utoipa::path(
    get,
    path = "/api/admin/website/hero-slides",
    tag = "Website",
    responses((status = 200, description = "Every slide in carousel order", body = Vec<HeroSlide>)),
    security(("api_jwt" = []))
)]
pub async fn list_slides(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
) -> Result<impl IntoResponse, AppError> {
    let slides = app_state
        .content_service
        .list_slides(&app_state.db_pool, false)
        .await?;
    Ok(Json(slides))
}

// POST /api/admin/website/hero-slides
#[utoipa::path(
    post,
    path = "/api/admin/website/hero-slides",
    tag = "Website",
    request_body = HeroSlidePayload,
    responses((status = 201, description = "Slide appended", body = HeroSlide)),
    security(("api_jwt" = []))
)]
pub async fn create_slide(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppJson(payload): AppJson<HeroSlidePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let slide = app_state
        .content_service
        .create_slide(&app_state.db_pool, &payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(slide)))
}

// PUT /api/admin/website/hero-slides/{id}
#[utoipa::path(
    put,
    path = "/api/admin/website/hero-slides/{id}",
    tag = "Website",
    params(("id" = Uuid, Path, description = "Slide id")),
    request_body = HeroSlidePayload,
    responses(
        (status = 200, description = "Slide updated", body = HeroSlide),
        (status = 404, description = "Unknown slide")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_slide(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<HeroSlidePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let slide = app_state
        .content_service
        .update_slide(&app_state.db_pool, id, &payload.into())
        .await?;

    Ok(Json(slide))
}

// DELETE /api/admin/website/hero-slides/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/website/hero-slides/{id}",
    tag = "Website",
    params(("id" = Uuid, Path, description = "Slide id")),
    responses(
        (status = 204, description = "Slide deleted"),
        (status = 404, description = "Unknown slide")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_slide(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.content_service.delete_slide(&app_state.db_pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/admin/website/hero-slides/order
#[utoipa::path(
    put,
    path = "/api/admin/website/hero-slides/order",
    tag = "Website",
    request_body = ReorderSlidesPayload,
    responses(
        (status = 200, description = "Slides in their new order", body = Vec<HeroSlide>),
        (status = 404, description = "A slide id is unknown, nothing moved")
    ),
    security(("api_jwt" = []))
)]
pub async fn reorder_slides(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppJson(payload): AppJson<ReorderSlidesPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let slides = app_state
        .content_service
        .reorder_slides(&app_state.db_pool, &payload.slide_ids)
        .await?;

    Ok(Json(slides))
}

// =============================================================================
//  ABOUT PAGE
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AboutPagePayload {
    #[validate(length(min = 1, max = 200, message = "Headline is required."))]
    pub headline: String,
    #[validate(length(min = 1, message = "Story is required."))]
    pub story: String,
    pub mission: Option<String>,
    pub vision: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[validate(range(min = 0, message = "Must not be negative."))]
    pub years_experience: Option<i32>,
    #[validate(range(min = 0, message = "Must not be negative."))]
    pub installations_completed: Option<i32>,
}

// GET /api/admin/website/about
#[utoipa::path(
    get,
    path = "/api/admin/website/about",
    tag = "Website",
    responses((status = 200, description = "About page", body = AboutPage)),
    security(("api_jwt" = []))
)]
pub async fn get_about(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.content_service.get_about(&app_state.db_pool).await?;
    Ok(Json(page))
}

// PUT /api/admin/website/about
#[utoipa::path(
    put,
    path = "/api/admin/website/about",
    tag = "Website",
    request_body = AboutPagePayload,
    responses((status = 200, description = "About page saved", body = AboutPage)),
    security(("api_jwt" = []))
)]
pub async fn save_about(
    State(app_state): State<AppState>,
    _editor: RequireRole<AdminOrManager>,
    AppJson(payload): AppJson<AboutPagePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let page = AboutPage {
        headline: payload.headline,
        story: payload.story,
        mission: payload.mission,
        vision: payload.vision,
        values: payload.values,
        years_experience: payload.years_experience,
        installations_completed: payload.installations_completed,
        updated_at: None,
    };
    let page = app_state
        .content_service
        .save_about(&app_state.db_pool, &page)
        .await?;

    Ok(Json(page))
}
