use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::error::ApiError;
use crate::models::{
    Ad, AdPayload, AdsQuery, Banner, BannerPayload, BannersQuery, DeleteResponse, SuccessResponse,
};
use crate::services::{BannerCounter, CacheKey};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/banners", web::get().to(live_banners))
        .route("/banners/{id}/impression", web::post().to(record_impression))
        .route("/banners/{id}/click", web::post().to(record_click))
        .route("/ads", web::get().to(active_ads))
        .route("/admin/banners", web::get().to(list_banners))
        .route("/admin/banners", web::post().to(create_banner))
        .route("/admin/banners/{id}", web::put().to(update_banner))
        .route("/admin/banners/{id}", web::delete().to(delete_banner))
        .route("/admin/ads", web::get().to(list_ads))
        .route("/admin/ads", web::post().to(create_ad))
        .route("/admin/ads/{id}", web::put().to(update_ad))
        .route("/admin/ads/{id}", web::delete().to(delete_ad));
}

fn enum_key<T: serde::Serialize>(value: Option<T>) -> Option<String> {
    value.and_then(|v| serde_json::to_value(v).ok()?.as_str().map(str::to_string))
}

/// GET /api/v1/banners?position=
async fn live_banners(
    state: web::Data<AppState>,
    query: web::Query<BannersQuery>,
) -> Result<HttpResponse, ApiError> {
    let today = Utc::now().date_naive();
    let key = CacheKey::banners(enum_key(query.position).as_deref(), today);
    if let Some(banners) = state.cache.get::<Vec<Banner>>(&key).await {
        return Ok(HttpResponse::Ok().json(banners));
    }

    let banners = state.postgres.live_banners(query.position, today).await?;
    state.cache.set(&key, &banners).await?;
    Ok(HttpResponse::Ok().json(banners))
}

async fn record_impression(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    state
        .postgres
        .bump_banner_counter(path.into_inner(), BannerCounter::Impression)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn record_click(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    state
        .postgres
        .bump_banner_counter(path.into_inner(), BannerCounter::Click)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

/// GET /api/v1/ads?category=
async fn active_ads(
    state: web::Data<AppState>,
    query: web::Query<AdsQuery>,
) -> Result<HttpResponse, ApiError> {
    let key = CacheKey::ads(enum_key(query.category).as_deref());
    if let Some(ads) = state.cache.get::<Vec<Ad>>(&key).await {
        return Ok(HttpResponse::Ok().json(ads));
    }

    let ads = state.postgres.active_ads(query.category).await?;
    state.cache.set(&key, &ads).await?;
    Ok(HttpResponse::Ok().json(ads))
}

async fn list_banners(
    _admin: AdminGuard,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let banners = state.postgres.list_all_banners().await?;
    Ok(HttpResponse::Ok().json(banners))
}

async fn create_banner(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<BannerPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let banner = state.postgres.create_banner(&req).await?;
    state.cache.invalidate_prefix(CacheKey::BANNERS)?;
    Ok(HttpResponse::Created().json(banner))
}

async fn update_banner(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: web::Json<BannerPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let banner = state.postgres.update_banner(path.into_inner(), &req).await?;
    state.cache.invalidate_prefix(CacheKey::BANNERS)?;
    Ok(HttpResponse::Ok().json(banner))
}

async fn delete_banner(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.postgres.delete_banner(id).await?;
    state.cache.invalidate_prefix(CacheKey::BANNERS)?;
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true, id }))
}

async fn list_ads(_admin: AdminGuard, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let ads = state.postgres.list_all_ads().await?;
    Ok(HttpResponse::Ok().json(ads))
}

async fn create_ad(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<AdPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let ad = state.postgres.create_ad(&req).await?;
    state.cache.invalidate_prefix(CacheKey::ADS)?;
    Ok(HttpResponse::Created().json(ad))
}

async fn update_ad(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: web::Json<AdPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let ad = state.postgres.update_ad(path.into_inner(), &req).await?;
    state.cache.invalidate_prefix(CacheKey::ADS)?;
    Ok(HttpResponse::Ok().json(ad))
}

async fn delete_ad(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.postgres.delete_ad(id).await?;
    state.cache.invalidate_prefix(CacheKey::ADS)?;
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true, id }))
}
