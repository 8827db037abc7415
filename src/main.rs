//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

fn build_router(app_state: AppState) -> Router {
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let public_routes = Router::new()
        .route("/blog", get(handlers::public::list_published_posts))
        .route("/blog/{slug}", get(handlers::public::get_published_post))
        .route("/testimonials", get(handlers::public::list_approved_testimonials))
        .route("/hero-slides", get(handlers::public::list_active_slides))
        .route("/about", get(handlers::public::get_public_about));

    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let crm_routes = Router::new()
        .route("/pipeline", get(handlers::crm::get_pipeline))
        .route(
            "/deals",
            get(handlers::crm::list_deals).post(handlers::crm::create_deal),
        )
        .route(
            "/deals/{id}",
            get(handlers::crm::get_deal)
                .put(handlers::crm::update_deal)
                .delete(handlers::crm::delete_deal),
        )
        .route("/deals/{id}/stage", post(handlers::crm::change_stage))
        .route(
            "/deals/{id}/activities",
            get(handlers::crm::list_deal_activities).post(handlers::crm::add_deal_activity),
        )
        .route("/activities", get(handlers::crm::list_recent_activities))
        .route(
            "/leads",
            get(handlers::crm::list_leads).post(handlers::crm::create_lead),
        )
        .route("/leads/{id}", get(handlers::crm::get_lead))
        .route("/leads/{id}/convert", post(handlers::crm::convert_lead));

    let admin_routes = Router::new()
        // Users
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user).put(handlers::users::update_user),
        )
        .route("/users/{id}/password", put(handlers::users::reset_password))
        // Staff
        .route(
            "/staff",
            get(handlers::staff::list_staff).post(handlers::staff::create_staff),
        )
        .route("/staff/compliance", get(handlers::staff::compliance_overview))
        .route(
            "/staff/{id}",
            get(handlers::staff::get_staff)
                .put(handlers::staff::update_staff)
                .delete(handlers::staff::deactivate_staff),
        )
        .route(
            "/staff/{id}/certifications",
            get(handlers::staff::get_certifications).put(handlers::staff::save_certifications),
        )
        .route(
            "/staff/{id}/reviews",
            get(handlers::staff::list_reviews).post(handlers::staff::create_review),
        )
        .route(
            "/staff/{id}/compensation",
            get(handlers::staff::get_compensation).put(handlers::staff::update_compensation),
        )
        // Teams
        .route(
            "/teams",
            get(handlers::staff::list_teams).post(handlers::staff::create_team),
        )
        .route(
            "/teams/{id}",
            get(handlers::staff::get_team)
                .put(handlers::staff::update_team)
                .delete(handlers::staff::delete_team),
        )
        .route("/teams/{id}/members", post(handlers::staff::add_team_member))
        .route(
            "/teams/{id}/members/{staff_id}",
            delete(handlers::staff::remove_team_member),
        )
        // Website
        .route(
            "/website/blog",
            get(handlers::content::list_posts).post(handlers::content::create_post),
        )
        .route(
            "/website/blog/{id}",
            get(handlers::content::get_post)
                .put(handlers::content::update_post)
                .delete(handlers::content::delete_post),
        )
        .route(
            "/website/testimonials",
            get(handlers::content::list_testimonials).post(handlers::content::create_testimonial),
        )
        .route(
            "/website/testimonials/{id}",
            put(handlers::content::update_testimonial).delete(handlers::content::delete_testimonial),
        )
        .route(
            "/website/hero-slides",
            get(handlers::content::list_slides).post(handlers::content::create_slide),
        )
        .route("/website/hero-slides/order", put(handlers::content::reorder_slides))
        .route(
            "/website/hero-slides/{id}",
            put(handlers::content::update_slide).delete(handlers::content::delete_slide),
        )
        .route(
            "/website/about",
            get(handlers::content::get_about).put(handlers::content::save_about),
        );

    let installer_routes = Router::new().route(
        "/serials/validate",
        post(handlers::serials::validate_serial_number),
    );

    // Everything below requires a bearer token.
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/crm", crm_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/installer", installer_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/public", public_routes)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        app_state.auth_service.seed_admin(email, password).await?;
    }

    let app = build_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
