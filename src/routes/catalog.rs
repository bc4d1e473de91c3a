use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::error::ApiError;
use crate::models::{
    DeleteResponse, OffersQuery, PartnerOffer, PartnerOfferPayload, Service, ServicePayload,
};
use crate::services::CacheKey;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/services", web::get().to(list_services))
        .route("/partner-offers", web::get().to(list_partner_offers))
        .route("/admin/services", web::post().to(create_service))
        .route("/admin/services/{id}", web::put().to(update_service))
        .route("/admin/services/{id}", web::delete().to(delete_service))
        .route("/admin/partner-offers", web::post().to(create_partner_offer))
        .route("/admin/partner-offers/{id}", web::put().to(update_partner_offer))
        .route("/admin/partner-offers/{id}", web::delete().to(delete_partner_offer));
}

/// GET /api/v1/services
async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    if let Some(services) = state.cache.get::<Vec<Service>>(CacheKey::SERVICES).await {
        return Ok(HttpResponse::Ok().json(services));
    }

    let services = state.postgres.list_services().await?;
    state.cache.set(CacheKey::SERVICES, &services).await?;
    Ok(HttpResponse::Ok().json(services))
}

/// GET /api/v1/partner-offers?category=
async fn list_partner_offers(
    state: web::Data<AppState>,
    query: web::Query<OffersQuery>,
) -> Result<HttpResponse, ApiError> {
    let category = query.filter();
    let key = CacheKey::partner_offers(category);
    if let Some(offers) = state.cache.get::<Vec<PartnerOffer>>(&key).await {
        return Ok(HttpResponse::Ok().json(offers));
    }

    let offers = state.postgres.list_partner_offers(category).await?;
    state.cache.set(&key, &offers).await?;
    Ok(HttpResponse::Ok().json(offers))
}

async fn create_service(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<ServicePayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let service = state.postgres.create_service(&req).await?;
    state.cache.invalidate_prefix(CacheKey::SERVICES)?;
    Ok(HttpResponse::Created().json(service))
}

async fn update_service(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: web::Json<ServicePayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let service = state.postgres.update_service(path.into_inner(), &req).await?;
    state.cache.invalidate_prefix(CacheKey::SERVICES)?;
    Ok(HttpResponse::Ok().json(service))
}

async fn delete_service(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.postgres.delete_service(id).await?;
    state.cache.invalidate_prefix(CacheKey::SERVICES)?;
    tracing::info!("Deleted service {}", id);
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true, id }))
}

async fn create_partner_offer(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<PartnerOfferPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let offer = state.postgres.create_partner_offer(&req).await?;
    state.cache.invalidate_prefix(CacheKey::PARTNER_OFFERS)?;
    Ok(HttpResponse::Created().json(offer))
}

async fn update_partner_offer(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: web::Json<PartnerOfferPayload>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let offer = state.postgres.update_partner_offer(path.into_inner(), &req).await?;
    state.cache.invalidate_prefix(CacheKey::PARTNER_OFFERS)?;
    Ok(HttpResponse::Ok().json(offer))
}

async fn delete_partner_offer(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.postgres.delete_partner_offer(id).await?;
    state.cache.invalidate_prefix(CacheKey::PARTNER_OFFERS)?;
    tracing::info!("Deleted partner offer {}", id);
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true, id }))
}
