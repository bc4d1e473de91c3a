use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// In-house service shown in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: String,
    pub icon: String,
    pub icon_url: Option<String>,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Third-party offer (bank, telephony, CRM, mobile) listed in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PartnerOffer {
    pub id: i32,
    pub category: String,
    pub partner: String,
    pub partner_logo: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub old_price: Option<String>,
    pub features: Vec<String>,
    pub rating: f64,
    pub reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
}

/// Lead submitted through the order form
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i32,
    pub service: String,
    pub price: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub comment: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "news_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    Draft,
    Ready,
    Published,
}

impl NewsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsStatus::Draft => "draft",
            NewsStatus::Ready => "ready",
            NewsStatus::Published => "published",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NewsArticle {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub badge: Option<String>,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub status: NewsStatus,
    pub published_date: Option<NaiveDate>,
    pub telegram_message_id: Option<i64>,
    pub vk_post_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article scraped from the news source, not yet stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub title: String,
    pub description: String,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub published_date: Option<NaiveDate>,
}

/// Client cabinet account; the password hash never leaves the store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAction {
    pub id: i64,
    pub user_id: Option<i32>,
    pub action_type: String,
    pub action_description: Option<String>,
    pub page_url: Option<String>,
    pub service_id: Option<i32>,
    pub partner_offer_id: Option<i32>,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "banner_position", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BannerPosition {
    Top,
    Middle,
    Bottom,
    Sidebar,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: i32,
    pub title: String,
    pub image_url: String,
    pub link_url: String,
    pub position: BannerPosition,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: i32,
    pub active: bool,
    pub clicks: i64,
    pub impressions: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ad_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdCategory {
    Bank,
    Phone,
    Crm,
    Mobile,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: i32,
    pub partner: String,
    pub title: String,
    pub description: String,
    pub category: AdCategory,
    pub price: Option<String>,
    pub old_price: Option<String>,
    pub features: Vec<String>,
    pub link_url: Option<String>,
    pub featured: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Article counts per pipeline status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsStats {
    pub drafts: i64,
    pub ready: i64,
    pub published: i64,
    pub total: i64,
}

impl NewsStats {
    /// Fold per-status row counts into totals
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (NewsStatus, i64)>,
    {
        counts.into_iter().fold(Self::default(), |mut stats, (status, count)| {
            match status {
                NewsStatus::Draft => stats.drafts += count,
                NewsStatus::Ready => stats.ready += count,
                NewsStatus::Published => stats.published += count,
            }
            stats.total += count;
            stats
        })
    }
}

/// Row of the all-users analytics report
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserActivitySummary {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub total_actions: i64,
    pub orders_count: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfileSummary {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub total_actions: i64,
    pub viewed_services: i64,
    pub viewed_offers: i64,
    pub orders_count: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActionCount {
    pub action_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceViews {
    pub service_name: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OfferViews {
    pub offer_name: String,
    pub partner: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServicePopularity {
    pub id: i32,
    pub title: String,
    pub price: String,
    pub view_count: i64,
    pub unique_users: i64,
}

/// Full analytics report for one client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReport {
    pub profile: UserProfileSummary,
    pub action_stats: Vec<ActionCount>,
    pub top_services: Vec<ServiceViews>,
    pub top_offers: Vec<OfferViews>,
}
