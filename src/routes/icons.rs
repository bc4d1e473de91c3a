use actix_web::http::header;
use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::error::ApiError;
use crate::models::{IconUploadRequest, IconUploadResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/icons", web::post().to(upload_icon))
        .route("/icons/{name}", web::get().to(serve_icon));
}

/// POST /api/v1/admin/icons
async fn upload_icon(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<IconUploadRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let url = state.icons.save(&req.image, &req.content_type).await?;
    Ok(HttpResponse::Created().json(IconUploadResponse { url }))
}

async fn serve_icon(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let (bytes, content_type) = state.icons.load(&path).await?;
    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
