// src/models/content.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "post_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

// --- BLOG ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    #[schema(example = "How many panels does a 6.6kW system need?")]
    pub title: String,
    #[schema(example = "how-many-panels-does-a-6-6kw-system-need")]
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    #[schema(example = "Guides")]
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BlogPostDraft {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
}

// --- TESTIMONIALS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    #[schema(example = "Karen W.")]
    pub customer_name: String,
    #[schema(example = "Baldivis, WA")]
    pub location: Option<String>,
    #[schema(example = 5)]
    pub rating: i16,
    pub content: String,
    pub system_size_kw: Option<Decimal>,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TestimonialDraft {
    pub customer_name: String,
    pub location: Option<String>,
    pub rating: i16,
    pub content: String,
    pub system_size_kw: Option<Decimal>,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub is_approved: bool,
}

// --- HERO CAROUSEL ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlide {
    pub id: Uuid,
    #[schema(example = "Battery rebates are here")]
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    #[schema(example = "Get a quote")]
    pub cta_label: Option<String>,
    #[schema(example = "/calculator")]
    pub cta_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HeroSlideDraft {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    pub is_active: bool,
}

// --- ABOUT PAGE ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AboutPage {
    pub headline: String,
    pub story: String,
    pub mission: Option<String>,
    pub vision: Option<String>,
    #[sqlx(rename = "company_values")]
    pub values: Vec<String>,
    pub years_experience: Option<i32>,
    pub installations_completed: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}
