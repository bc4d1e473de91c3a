use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use std::future::{ready, Ready};
use validator::Validate;

use super::AppState;
use crate::core::password::verify_admin_password;
use crate::error::ApiError;
use crate::models::{AdminLoginRequest, AdminTokenResponse};
use crate::services::{AuthError, Claims};

/// Extractor that admits only requests carrying a valid admin token.
///
/// The token is read from `Authorization: Bearer <jwt>` or, for clients that
/// cannot set that header, from `X-Authorization`.
#[derive(Debug, Clone)]
pub struct AdminGuard(pub Claims);

impl FromRequest for AdminGuard {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

fn authorize(req: &HttpRequest) -> Result<AdminGuard, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("Application state is not configured".into()))?;

    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    let claims = state.tokens.verify(token)?;
    Ok(AdminGuard(claims))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    ["Authorization", "X-Authorization"]
        .iter()
        .filter_map(|name| req.headers().get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(|value| value.trim())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .find(|token| !token.is_empty())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/login", web::post().to(admin_login));
}

/// POST /api/v1/admin/login
async fn admin_login(
    state: web::Data<AppState>,
    req: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let username_ok = req.username.trim() == state.auth.admin_username;
    let password_ok = verify_admin_password(&req.password, &state.auth.admin_password_sha256);
    if !(username_ok && password_ok) {
        tracing::warn!("Failed admin login for '{}'", req.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let (token, expires_at) = state.tokens.issue(&state.auth.admin_username)?;
    tracing::info!("Admin '{}' logged in", state.auth.admin_username);

    Ok(HttpResponse::Ok().json(AdminTokenResponse { token, expires_at }))
}
