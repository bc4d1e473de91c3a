use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::error::ApiError;
use crate::models::{
    AdminNewsQuery, CreatedResponse, DeleteResponse, NewsListQuery, NewsListResponse, NewsPage,
    NewsPayload, PublishResponse,
};

const PUBLIC_PAGE_SIZE: i64 = 20;
const ADMIN_PAGE_SIZE: i64 = 100;
const ADMIN_PAGE_MAX: i64 = 500;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/news", web::get().to(published_news))
        .route("/news/{id}", web::get().to(published_article))
        .route("/admin/news", web::get().to(list_news))
        .route("/admin/news", web::post().to(create_news))
        .route("/admin/news/{id}", web::put().to(update_news))
        .route("/admin/news/{id}", web::delete().to(delete_news))
        .route("/admin/news/{id}/publish", web::post().to(publish_news));
}

/// GET /api/v1/news?limit=&offset=
async fn published_news(
    state: web::Data<AppState>,
    query: web::Query<NewsListQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit_or(PUBLIC_PAGE_SIZE);
    let offset = query.offset();
    let (news, total) = state.postgres.published_news_page(limit, offset).await?;

    Ok(HttpResponse::Ok().json(NewsPage {
        success: true,
        news,
        total,
        limit,
        offset,
    }))
}

async fn published_article(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let article = state.postgres.published_article(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(article))
}

async fn list_news(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    query: web::Query<AdminNewsQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(ADMIN_PAGE_SIZE).clamp(1, ADMIN_PAGE_MAX);
    let offset = query.offset.unwrap_or(0).max(0);
    let news = state.postgres.list_news(query.status, limit, offset).await?;

    Ok(HttpResponse::Ok().json(NewsListResponse { success: true, news }))
}

async fn create_news(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<NewsPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let id = state.postgres.create_news(&req, Utc::now().date_naive()).await?;

    Ok(HttpResponse::Created().json(CreatedResponse {
        success: true,
        id,
        message: "News created".to_string(),
    }))
}

/// Full update; an article switched to published without a date gets today's
async fn update_news(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: web::Json<NewsPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let article = state
        .postgres
        .update_news(path.into_inner(), &req, Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Ok().json(article))
}

async fn delete_news(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.postgres.delete_news(id).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true, id }))
}

/// POST /api/v1/admin/news/{id}/publish
async fn publish_news(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let article = state.pipeline.publish_one(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PublishResponse {
        success: true,
        telegram_message_id: article.telegram_message_id,
        vk_post_id: article.vk_post_id,
    }))
}
