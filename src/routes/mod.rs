// Route exports
pub mod ads;
pub mod agent;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod icons;
pub mod news;
pub mod orders;
pub mod users;

use actix_web::web;
use std::sync::Arc;

use crate::config::{AuthSettings, Settings};
use crate::core::{AgentLog, AutoScheduler, NewsPipeline, NewsStore, PipelineError, ScheduleConfig};
use crate::services::{CatalogCache, IconStore, PostgresClient, TokenIssuer};

pub use auth::AdminGuard;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CatalogCache>,
    pub auth: Arc<AuthSettings>,
    pub tokens: Arc<TokenIssuer>,
    pub pipeline: Arc<NewsPipeline>,
    pub scheduler: Arc<AutoScheduler>,
    pub icons: Arc<IconStore>,
}

impl AppState {
    /// Wire every service from settings; the scheduler is created but not started
    pub fn from_settings(settings: &Settings, postgres: PostgresClient) -> Result<Self, PipelineError> {
        let postgres = Arc::new(postgres);

        let mut auth = settings.auth.clone();
        if auth.jwt_secret.is_empty() {
            tracing::warn!("JWT secret is not configured, admin tokens will not survive a restart");
            auth.jwt_secret = format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
        }
        if auth.admin_password_sha256.is_empty() {
            tracing::warn!("Admin password hash is not configured, admin login is disabled");
        }
        let tokens = Arc::new(TokenIssuer::new(&auth.jwt_secret, auth.token_ttl_hours));

        let log = Arc::new(AgentLog::new(settings.scheduler.log_capacity));
        let store: Arc<dyn NewsStore> = postgres.clone();
        let pipeline = Arc::new(NewsPipeline::new(store, settings, Arc::clone(&log))?);
        let scheduler = Arc::new(AutoScheduler::new(
            pipeline.clone(),
            log,
            ScheduleConfig::from_minutes(settings.scheduler.enabled, settings.scheduler.interval_minutes),
        ));

        Ok(Self {
            postgres,
            cache: Arc::new(CatalogCache::new(settings.cache.capacity, settings.cache.ttl_secs)),
            auth: Arc::new(auth),
            tokens,
            pipeline,
            scheduler,
            icons: Arc::new(IconStore::new(&settings.uploads)),
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(auth::configure)
            .configure(catalog::configure)
            .configure(orders::configure)
            .configure(users::configure)
            .configure(analytics::configure)
            .configure(ads::configure)
            .configure(news::configure)
            .configure(agent::configure)
            .configure(icons::configure),
    );
}
