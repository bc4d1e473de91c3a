use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::error::ApiError;
use crate::models::{ActionLoggedResponse, ActionsQuery, LogActionRequest};

const MAX_IP_CHARS: usize = 64;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/analytics/actions", web::post().to(log_action))
        .route("/admin/analytics/actions", web::get().to(list_actions))
        .route("/admin/analytics/reports/users", web::get().to(users_report))
        .route("/admin/analytics/reports/users/{id}", web::get().to(user_report))
        .route(
            "/admin/analytics/reports/popular-services",
            web::get().to(popular_services),
        );
}

/// POST /api/v1/analytics/actions
///
/// Client IP and User-Agent fall back to the request's own when the body omits them.
async fn log_action(
    state: web::Data<AppState>,
    req: web::Json<LogActionRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    // Forwarded headers are client supplied; keep within the column width
    let remote_addr = http_req
        .connection_info()
        .realip_remote_addr()
        .map(|addr| addr.chars().take(MAX_IP_CHARS).collect::<String>());
    let ip_address = req.ip_address.as_deref().or(remote_addr.as_deref());
    let user_agent = req.user_agent.as_deref().or_else(|| {
        http_req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    });

    let (id, created_at) = state
        .postgres
        .log_action(&req, ip_address, user_agent)
        .await?;

    Ok(HttpResponse::Created().json(ActionLoggedResponse { id, created_at }))
}

async fn list_actions(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    query: web::Query<ActionsQuery>,
) -> Result<HttpResponse, ApiError> {
    let actions = state
        .postgres
        .list_actions(query.user_id, query.action_type.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(actions))
}

async fn users_report(
    _admin: AdminGuard,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let report = state.postgres.users_activity_report().await?;
    Ok(HttpResponse::Ok().json(report))
}

async fn user_report(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let report = state.postgres.user_report(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

async fn popular_services(
    _admin: AdminGuard,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let report = state.postgres.popular_services().await?;
    Ok(HttpResponse::Ok().json(report))
}
