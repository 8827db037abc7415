// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{ContentRepository, CrmRepository, StaffRepository, UserRepository},
    services::{
        auth::AuthService, content_service::ContentService, crm_service::CrmService,
        staff_service::StaffService, user_service::UserService,
    },
};

/// Process configuration, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {}", raw))?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            max_connections,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub crm_service: CrmService,
    pub staff_service: StaffService,
    pub content_service: ContentService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("Database connection established");

        Ok(Self::from_pool(db_pool, config.jwt_secret.clone()))
    }

    /// Wires repositories and services on top of an existing pool.
    pub fn from_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new();
        let staff_repo = StaffRepository::new();
        let content_repo = ContentRepository::new();

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret);
        let user_service = UserService::new(user_repo);
        let crm_service = CrmService::new(crm_repo);
        let staff_service = StaffService::new(staff_repo);
        let content_service = ContentService::new(content_repo);

        Self {
            db_pool,
            auth_service,
            user_service,
            crm_service,
            staff_service,
            content_service,
        }
    }
}
