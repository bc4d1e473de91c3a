use actix_web::{web, HttpResponse};
use serde_json::json;
use std::time::Duration;
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::error::ApiError;
use crate::models::{ScheduleUpdateRequest, TelegramChannelsResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/agent/stats", web::get().to(stats))
        .route("/admin/agent/scrape", web::post().to(scrape))
        .route("/admin/agent/process", web::post().to(process))
        .route("/admin/agent/publish", web::post().to(publish))
        .route("/admin/agent/auto", web::post().to(auto))
        .route("/admin/agent/logs", web::get().to(logs))
        .route("/admin/agent/telegram-channels", web::get().to(telegram_channels))
        .route("/admin/agent/schedule", web::get().to(schedule))
        .route("/admin/agent/schedule", web::put().to(update_schedule));
}

async fn stats(_admin: AdminGuard, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let stats = state.pipeline.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

async fn scrape(_admin: AdminGuard, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.pipeline.scrape().await?;
    Ok(HttpResponse::Ok().json(report))
}

async fn process(_admin: AdminGuard, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.pipeline.process().await?;
    Ok(HttpResponse::Ok().json(report))
}

async fn publish(_admin: AdminGuard, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.pipeline.publish().await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Full pipeline run; 409 while another run holds the pipeline
async fn auto(_admin: AdminGuard, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let report = state.pipeline.auto().await?;
    Ok(HttpResponse::Ok().json(report))
}

async fn logs(_admin: AdminGuard, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "logs": state.pipeline.agent_log().entries() }))
}

async fn telegram_channels(
    _admin: AdminGuard,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let channels = state.pipeline.telegram_channels().await?;
    let message = if channels.is_empty() {
        "Каналов не найдено. Убедитесь, что бот добавлен в канал как администратор и в канале есть хотя бы одно сообщение.".to_string()
    } else {
        format!("Найдено каналов: {}", channels.len())
    };

    Ok(HttpResponse::Ok().json(TelegramChannelsResponse { channels, message }))
}

async fn schedule(_admin: AdminGuard, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.scheduler.status())
}

async fn update_schedule(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<ScheduleUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let interval = req.interval_minutes.map(|m| Duration::from_secs(m * 60));
    let status = state.scheduler.update(req.enabled, interval);
    Ok(HttpResponse::Ok().json(status))
}
