// src/db/content_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::content::{
        AboutPage, BlogPost, BlogPostDraft, HeroSlide, HeroSlideDraft, PostStatus, Testimonial,
        TestimonialDraft,
    },
};

#[derive(Clone, Default)]
pub struct ContentRepository;

impl ContentRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  BLOG
    // =========================================================================

    pub async fn list_posts<'e, E>(
        &self,
        executor: E,
        published_only: bool,
    ) -> Result<Vec<BlogPost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let posts = sqlx::query_as!(
            BlogPost,
            r#"
            SELECT
                id, title, slug, excerpt, content, cover_image_url, category, tags,
                status as "status: PostStatus",
                published_at, author_id, created_at, updated_at
            FROM blog_posts
            WHERE NOT $1 OR status = 'PUBLISHED'
            ORDER BY COALESCE(published_at, created_at) DESC
            "#,
            published_only
        )
        .fetch_all(executor)
        .await?;
        Ok(posts)
    }

    pub async fn find_post<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<BlogPost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let post = sqlx::query_as!(
            BlogPost,
            r#"
            SELECT
                id, title, slug, excerpt, content, cover_image_url, category, tags,
                status as "status: PostStatus",
                published_at, author_id, created_at, updated_at
            FROM blog_posts
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(executor)
        .await?;
        Ok(post)
    }

    pub async fn find_published_by_slug<'e, E>(
        &self,
        executor: E,
        slug: &str,
    ) -> Result<Option<BlogPost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let post = sqlx::query_as!(
            BlogPost,
            r#"
            SELECT
                id, title, slug, excerpt, content, cover_image_url, category, tags,
                status as "status: PostStatus",
                published_at, author_id, created_at, updated_at
            FROM blog_posts
            WHERE slug = $1 AND status = 'PUBLISHED'
            "#,
            slug
        )
        .fetch_optional(executor)
        .await?;
        Ok(post)
    }

    pub async fn create_post<'e, E>(
        &self,
        executor: E,
        draft: &BlogPostDraft,
        author_id: Option<Uuid>,
    ) -> Result<BlogPost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as!(
            BlogPost,
            r#"
            INSERT INTO blog_posts (
                title, slug, excerpt, content, cover_image_url, category, tags,
                status, published_at, author_id
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                CASE WHEN $8 = 'PUBLISHED'::post_status THEN NOW() END,
                $9
            )
            RETURNING
                id, title, slug, excerpt, content, cover_image_url, category, tags,
                status as "status: PostStatus",
                published_at, author_id, created_at, updated_at
            "#,
            draft.title,
            draft.slug,
            draft.excerpt.as_deref(),
            draft.content,
            draft.cover_image_url.as_deref(),
            draft.category.as_deref(),
            draft.tags.as_slice(),
            draft.status as PostStatus,
            author_id
        )
        .fetch_one(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("Slug '{}' is already in use.", draft.slug))
        })
    }

    /// `published_at` is kept once set; it is only stamped on the first publish.
    pub async fn update_post<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &BlogPostDraft,
    ) -> Result<Option<BlogPost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as!(
            BlogPost,
            r#"
            UPDATE blog_posts
            SET title = $2, slug = $3, excerpt = $4, content = $5, cover_image_url = $6,
                category = $7, tags = $8, status = $9,
                published_at = CASE
                    WHEN $9 = 'PUBLISHED'::post_status THEN COALESCE(published_at, NOW())
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, title, slug, excerpt, content, cover_image_url, category, tags,
                status as "status: PostStatus",
                published_at, author_id, created_at, updated_at
            "#,
            id,
            draft.title,
            draft.slug,
            draft.excerpt.as_deref(),
            draft.content,
            draft.cover_image_url.as_deref(),
            draft.category.as_deref(),
            draft.tags.as_slice(),
            draft.status as PostStatus
        )
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, format!("Slug '{}' is already in use.", draft.slug))
        })
    }

    pub async fn delete_post<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query!("DELETE FROM blog_posts WHERE id = $1", id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  TESTIMONIALS
    // =========================================================================

    pub async fn list_testimonials<'e, E>(
        &self,
        executor: E,
        approved_only: bool,
    ) -> Result<Vec<Testimonial>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let testimonials = sqlx::query_as!(
            Testimonial,
            r#"
            SELECT
                id, customer_name, location, rating, content, system_size_kw,
                image_url, is_featured, is_approved, created_at, updated_at
            FROM testimonials
            WHERE NOT $1 OR is_approved
            ORDER BY is_featured DESC, created_at DESC
            "#,
            approved_only
        )
        .fetch_all(executor)
        .await?;
        Ok(testimonials)
    }

    pub async fn create_testimonial<'e, E>(
        &self,
        executor: E,
        draft: &TestimonialDraft,
    ) -> Result<Testimonial, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let testimonial = sqlx::query_as!(
            Testimonial,
            r#"
            INSERT INTO testimonials (
                customer_name, location, rating, content, system_size_kw,
                image_url, is_featured, is_approved
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, customer_name, location, rating, content, system_size_kw,
                image_url, is_featured, is_approved, created_at, updated_at
            "#,
            draft.customer_name,
            draft.location.as_deref(),
            draft.rating,
            draft.content,
            draft.system_size_kw,
            draft.image_url.as_deref(),
            draft.is_featured,
            draft.is_approved
        )
        .fetch_one(executor)
        .await?;
        Ok(testimonial)
    }

    pub async fn update_testimonial<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &TestimonialDraft,
    ) -> Result<Option<Testimonial>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let testimonial = sqlx::query_as!(
            Testimonial,
            r#"
            UPDATE testimonials
            SET customer_name = $2, location = $3, rating = $4, content = $5,
                system_size_kw = $6, image_url = $7, is_featured = $8, is_approved = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, customer_name, location, rating, content, system_size_kw,
                image_url, is_featured, is_approved, created_at, updated_at
            "#,
            id,
            draft.customer_name,
            draft.location.as_deref(),
            draft.rating,
            draft.content,
            draft.system_size_kw,
            draft.image_url.as_deref(),
            draft.is_featured,
            draft.is_approved
        )
        .fetch_optional(executor)
        .await?;
        Ok(testimonial)
    }

    pub async fn delete_testimonial<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query!("DELETE FROM testimonials WHERE id = $1", id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  HERO SLIDES
    // =========================================================================

    pub async fn list_slides<'e, E>(
        &self,
        executor: E,
        active_only: bool,
    ) -> Result<Vec<HeroSlide>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slides = sqlx::query_as!(
            HeroSlide,
            r#"
            SELECT
                id, title, subtitle, image_url, cta_label, cta_url, position, is_active,
                created_at, updated_at
            FROM hero_slides
            WHERE NOT $1 OR is_active
            ORDER BY position ASC, created_at ASC
            "#,
            active_only
        )
        .fetch_all(executor)
        .await?;
        Ok(slides)
    }

    /// New slides go to the end of the carousel.
    pub async fn create_slide<'e, E>(
        &self,
        executor: E,
        draft: &HeroSlideDraft,
    ) -> Result<HeroSlide, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slide = sqlx::query_as!(
            HeroSlide,
            r#"
            INSERT INTO hero_slides (title, subtitle, image_url, cta_label, cta_url, is_active, position)
            VALUES ($1, $2, $3, $4, $5, $6, (SELECT COALESCE(MAX(position) + 1, 0) FROM hero_slides))
            RETURNING
                id, title, subtitle, image_url, cta_label, cta_url, position, is_active,
                created_at, updated_at
            "#,
            draft.title,
            draft.subtitle.as_deref(),
            draft.image_url,
            draft.cta_label.as_deref(),
            draft.cta_url.as_deref(),
            draft.is_active
        )
        .fetch_one(executor)
        .await?;
        Ok(slide)
    }

    pub async fn update_slide<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &HeroSlideDraft,
    ) -> Result<Option<HeroSlide>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slide = sqlx::query_as!(
            HeroSlide,
            r#"
            UPDATE hero_slides
            SET title = $2, subtitle = $3, image_url = $4, cta_label = $5, cta_url = $6,
                is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, title, subtitle, image_url, cta_label, cta_url, position, is_active,
                created_at, updated_at
            "#,
            id,
            draft.title,
            draft.subtitle.as_deref(),
            draft.image_url,
            draft.cta_label.as_deref(),
            draft.cta_url.as_deref(),
            draft.is_active
        )
        .fetch_optional(executor)
        .await?;
        Ok(slide)
    }

    pub async fn set_slide_position<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        position: i32,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query!(
            "UPDATE hero_slides SET position = $2, updated_at = NOW() WHERE id = $1",
            id,
            position
        )
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_slide<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query!("DELETE FROM hero_slides WHERE id = $1", id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  ABOUT PAGE
    // =========================================================================

    pub async fn find_about<'e, E>(&self, executor: E) -> Result<Option<AboutPage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let page = sqlx::query_as!(
            AboutPage,
            r#"
            SELECT
                headline, story, mission, vision,
                company_values as "values",
                years_experience, installations_completed,
                updated_at as "updated_at?"
            FROM about_page
            WHERE id = 1
            "#
        )
        .fetch_optional(executor)
        .await?;
        Ok(page)
    }

    pub async fn upsert_about<'e, E>(&self, executor: E, page: &AboutPage) -> Result<AboutPage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let page = sqlx::query_as!(
            AboutPage,
            r#"
            INSERT INTO about_page (
                id, headline, story, mission, vision, company_values,
                years_experience, installations_completed
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                headline = EXCLUDED.headline,
                story = EXCLUDED.story,
                mission = EXCLUDED.mission,
                vision = EXCLUDED.vision,
                company_values = EXCLUDED.company_values,
                years_experience = EXCLUDED.years_experience,
                installations_completed = EXCLUDED.installations_completed,
                updated_at = NOW()
            RETURNING
                headline, story, mission, vision,
                company_values as "values",
                years_experience, installations_completed,
                updated_at as "updated_at?"
            "#,
            page.headline,
            page.story,
            page.mission.as_deref(),
            page.vision.as_deref(),
            page.values.as_slice(),
            page.years_experience,
            page.installations_completed
        )
        .fetch_one(executor)
        .await?;
        Ok(page)
    }
}
