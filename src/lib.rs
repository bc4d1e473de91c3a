//! Kupets API - backend for the "Купец в плюсе" business-services aggregator
//!
//! Serves the public catalog (in-house services, partner offers, banners, ads),
//! captures leads, runs the client cabinet with activity analytics and drives
//! the news agent that scrapes, rewrites and publishes articles to Telegram and VK.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{AutoScheduler, NewsPipeline, NewsStore, PipelineError, ScrapeRules};
pub use error::ApiError;
pub use models::{NewsArticle, NewsStatus, ScrapedItem};
pub use routes::AppState;
