use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{NewsArticle, User};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedResponse {
    pub success: bool,
    pub order_id: i32,
    pub message: String,
}

/// Public page of published news
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPage {
    pub success: bool,
    pub news: Vec<NewsArticle>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsListResponse {
    pub success: bool,
    pub news: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub success: bool,
    pub telegram_message_id: Option<i64>,
    pub vk_post_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSessionResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLoggedResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconUploadResponse {
    pub url: String,
}

/// Channel the bot can post into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramChannel {
    pub id: i64,
    pub title: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChannelsResponse {
    pub channels: Vec<TelegramChannel>,
    pub message: String,
}

/// Account created from the back-office; carries the password only when it was generated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserCreatedResponse {
    pub success: bool,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}
