use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::core::password::{generate_password, hash_password, verify_password};
use crate::error::ApiError;
use crate::models::{
    AdminCreateUserRequest, AdminUserCreatedResponse, DeleteResponse, LoginRequest,
    RegisterRequest, UpdateUserRequest, UserSessionResponse,
};
use crate::services::NewUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users/register", web::post().to(register))
        .route("/users/login", web::post().to(login))
        .route("/admin/users", web::get().to(list_users))
        .route("/admin/users", web::post().to(create_user))
        .route("/admin/users/{id}", web::get().to(get_user))
        .route("/admin/users/{id}", web::put().to(update_user))
        .route("/admin/users/{id}", web::delete().to(deactivate_user));
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// POST /api/v1/users/register
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let password_hash = hash_password(&req.password);
    let user = state
        .postgres
        .create_user(NewUser {
            email: &req.email,
            password_hash: &password_hash,
            full_name: &req.full_name,
            phone: optional(&req.phone),
            company_name: optional(&req.company_name),
        })
        .await?;

    Ok(HttpResponse::Created().json(UserSessionResponse { success: true, user }))
}

/// POST /api/v1/users/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let credentials = state
        .postgres
        .find_credentials_by_email(&req.email)
        .await?
        .filter(|c| verify_password(&req.password, &c.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    if !credentials.user.is_active {
        tracing::info!("Login attempt for deactivated user {}", credentials.user.id);
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }

    let user = state.postgres.record_login(credentials.user.id).await?;
    Ok(HttpResponse::Ok().json(UserSessionResponse { success: true, user }))
}

async fn list_users(
    _admin: AdminGuard,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let users = state.postgres.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

async fn get_user(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let user = state.postgres.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

async fn create_user(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    req: web::Json<AdminCreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let generated_password = match &req.password {
        Some(_) => None,
        None => Some(generate_password()),
    };
    let password = req
        .password
        .as_deref()
        .or(generated_password.as_deref())
        .unwrap_or_default();
    let password_hash = hash_password(password);

    let user = state
        .postgres
        .create_user(NewUser {
            email: &req.email,
            password_hash: &password_hash,
            full_name: &req.full_name,
            phone: optional(&req.phone),
            company_name: optional(&req.company_name),
        })
        .await?;

    Ok(HttpResponse::Created().json(AdminUserCreatedResponse {
        success: true,
        user,
        generated_password,
    }))
}

async fn update_user(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let user = state.postgres.update_user(path.into_inner(), &req).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Soft delete: the account is deactivated, its history is kept
async fn deactivate_user(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.postgres.deactivate_user(id).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse { success: true, id }))
}
