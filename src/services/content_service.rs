// src/services/content_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ContentRepository,
    models::content::{
        AboutPage, BlogPost, BlogPostDraft, HeroSlide, HeroSlideDraft, Testimonial,
        TestimonialDraft,
    },
};

fn not_found(kind: &str, id: Uuid) -> AppError {
    AppError::ResourceNotFound(format!("{} {} not found", kind, id))
}

/// Lowercase ASCII slug: runs of anything that is not a letter or digit
/// collapse into a single dash.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Uses the given slug (re-slugified) or derives one from the title.
fn resolve_slug(mut draft: BlogPostDraft) -> Result<BlogPostDraft, AppError> {
    let source = if draft.slug.trim().is_empty() {
        draft.title.clone()
    } else {
        draft.slug.clone()
    };
    draft.slug = slugify(&source);

    if draft.slug.is_empty() {
        return Err(AppError::BadRequest(
            "A slug could not be derived from the title".into(),
        ));
    }
    Ok(draft)
}

#[derive(Clone)]
pub struct ContentService {
    repo: ContentRepository,
}

impl ContentService {
    pub fn new(repo: ContentRepository) -> Self {
        Self { repo }
    }

    // --- BLOG ---

    pub async fn list_posts<'e, E>(&self, executor: E, published_only: bool) -> Result<Vec<BlogPost>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_posts(executor, published_only).await
    }

    pub async fn get_post<'e, E>(&self, executor: E, id: Uuid) -> Result<BlogPost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_post(executor, id)
            .await?
            .ok_or_else(|| not_found("Blog post", id))
    }

    pub async fn get_published_post<'e, E>(&self, executor: E, slug: &str) -> Result<BlogPost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_published_by_slug(executor, slug)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Blog post '{}' not found", slug)))
    }

    pub async fn create_post<'e, E>(
        &self,
        executor: E,
        draft: BlogPostDraft,
        author_id: Uuid,
    ) -> Result<BlogPost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let draft = resolve_slug(draft)?;
        let post = self.repo.create_post(executor, &draft, Some(author_id)).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "Blog post created");
        Ok(post)
    }

    pub async fn update_post<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: BlogPostDraft,
    ) -> Result<BlogPost, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let draft = resolve_slug(draft)?;
        self.repo
            .update_post(executor, id, &draft)
            .await?
            .ok_or_else(|| not_found("Blog post", id))
    }

    pub async fn delete_post<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_post(executor, id).await? {
            return Err(not_found("Blog post", id));
        }
        Ok(())
    }

    // --- TESTIMONIALS ---

    pub async fn list_testimonials<'e, E>(
        &self,
        executor: E,
        approved_only: bool,
    ) -> Result<Vec<Testimonial>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_testimonials(executor, approved_only).await
    }

    pub async fn create_testimonial<'e, E>(
        &self,
        executor: E,
        draft: &TestimonialDraft,
    ) -> Result<Testimonial, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_testimonial(executor, draft).await
    }

    pub async fn update_testimonial<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &TestimonialDraft,
    ) -> Result<Testimonial, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_testimonial(executor, id, draft)
            .await?
            .ok_or_else(|| not_found("Testimonial", id))
    }

    pub async fn delete_testimonial<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_testimonial(executor, id).await? {
            return Err(not_found("Testimonial", id));
        }
        Ok(())
    }

    // --- HERO SLIDES ---

    pub async fn list_slides<'e, E>(&self, executor: E, active_only: bool) -> Result<Vec<HeroSlide>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_slides(executor, active_only).await
    }

    pub async fn create_slide<'e, E>(&self, executor: E, draft: &HeroSlideDraft) -> Result<HeroSlide, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_slide(executor, draft).await
    }

    pub async fn update_slide<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        draft: &HeroSlideDraft,
    ) -> Result<HeroSlide, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_slide(executor, id, draft)
            .await?
            .ok_or_else(|| not_found("Hero slide", id))
    }

    pub async fn delete_slide<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_slide(executor, id).await? {
            return Err(not_found("Hero slide", id));
        }
        Ok(())
    }

    /// Positions follow the order of `ids`. Either every slide moves or none does.
    pub async fn reorder_slides<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<HeroSlide>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        for (position, id) in ids.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| AppError::BadRequest("Too many slides".into()))?;
            if !self.repo.set_slide_position(&mut *tx, *id, position).await? {
                return Err(not_found("Hero slide", *id));
            }
        }

        let slides = self.repo.list_slides(&mut *tx, false).await?;
        tx.commit().await?;
        Ok(slides)
    }

    // --- ABOUT PAGE ---

    /// Empty page until one has been saved.
    pub async fn get_about<'e, E>(&self, executor: E) -> Result<AboutPage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(self.repo.find_about(executor).await?.unwrap_or_default())
    }

    pub async fn save_about<'e, E>(&self, executor: E, page: &AboutPage) -> Result<AboutPage, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.upsert_about(executor, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::PostStatus;

    fn draft(title: &str, slug: &str) -> BlogPostDraft {
        BlogPostDraft {
            title: title.into(),
            slug: slug.into(),
            excerpt: None,
            content: "...".into(),
            cover_image_url: None,
            category: None,
            tags: vec![],
            status: PostStatus::Draft,
        }
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(
            slugify("How many panels does a 6.6kW system need?"),
            "how-many-panels-does-a-6-6kw-system-need"
        );
        assert_eq!(slugify("  --Battery   Rebates!! 2025 "), "battery-rebates-2025");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn slug_falls_back_to_title() {
        assert_eq!(resolve_slug(draft("Winter Output", "")).unwrap().slug, "winter-output");
        assert_eq!(resolve_slug(draft("Winter Output", "My Slug")).unwrap().slug, "my-slug");
        assert!(matches!(resolve_slug(draft("!!!", " ")), Err(AppError::BadRequest(_))));
    }
}
