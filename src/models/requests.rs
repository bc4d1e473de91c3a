use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{AdCategory, BannerPosition, NewsStatus, OrderStatus};

/// Create or replace a catalog service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServicePayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 128))]
    pub price: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub icon: Option<String>,
    #[serde(default, alias = "iconUrl")]
    #[validate(url)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl ServicePayload {
    pub fn icon_or_default(&self) -> &str {
        self.icon.as_deref().filter(|icon| !icon.is_empty()).unwrap_or("Package")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PartnerOfferPayload {
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    #[validate(length(min = 1, max = 255))]
    pub partner: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub partner_logo: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 128))]
    pub price: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub old_price: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub reviews: Option<i32>,
}

impl PartnerOfferPayload {
    pub fn logo_or_default(&self) -> &str {
        self.partner_logo.as_deref().filter(|logo| !logo.is_empty()).unwrap_or("🏢")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffersQuery {
    pub category: Option<String>,
}

impl OffersQuery {
    /// Category filter, with "all" meaning no filter
    pub fn filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "all")
    }
}

/// Lead form submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub service: String,
    #[validate(length(min = 1, max = 128))]
    pub price: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 5, max = 32))]
    pub phone: String,
    #[serde(default)]
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub company: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Account created from the back-office; a password is generated when omitted
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_user_update"))]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub company_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn validate_user_update(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    if req.full_name.is_none()
        && req.phone.is_none()
        && req.company_name.is_none()
        && req.is_active.is_none()
    {
        return Err(ValidationError::new("empty_update"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogActionRequest {
    #[serde(default)]
    pub user_id: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub action_type: String,
    #[serde(default)]
    pub action_description: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub service_id: Option<i32>,
    #[serde(default)]
    pub partner_offer_id: Option<i32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionsQuery {
    pub user_id: Option<i32>,
    #[serde(rename = "type")]
    pub action_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl NewsListQuery {
    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminNewsQuery {
    pub status: Option<NewsStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewsPayload {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub badge: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub source_url: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: Option<NewsStatus>,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
}

impl NewsPayload {
    pub fn status_or_draft(&self) -> NewsStatus {
        self.status.unwrap_or(NewsStatus::Draft)
    }

    /// Publication date to store: published articles always carry one
    pub fn effective_published_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match (self.status_or_draft(), self.published_date) {
            (NewsStatus::Published, None) => Some(today),
            (_, date) => date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_banner_window"))]
pub struct BannerPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(url)]
    pub image_url: String,
    #[validate(url)]
    pub link_url: String,
    pub position: BannerPosition,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn validate_banner_window(banner: &BannerPayload) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (banner.start_date, banner.end_date) {
        if start > end {
            return Err(ValidationError::new("start_after_end"));
        }
    }
    Ok(())
}

fn default_priority() -> i32 {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BannersQuery {
    pub position: Option<BannerPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdPayload {
    #[validate(length(min = 1, max = 255))]
    pub partner: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub category: AdCategory,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub price: Option<String>,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub old_price: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    #[validate(url)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdsQuery {
    pub category: Option<AdCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IconUploadRequest {
    #[validate(length(min = 1))]
    pub image: String,
    #[serde(rename = "contentType", alias = "content_type", default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "image/png".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ScheduleUpdateRequest {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, alias = "intervalMinutes")]
    #[validate(range(min = 1, max = 1440))]
    pub interval_minutes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offers_query_all_means_unfiltered() {
        let all = OffersQuery { category: Some("all".to_string()) };
        let bank = OffersQuery { category: Some("bank".to_string()) };
        assert_eq!(all.filter(), None);
        assert_eq!(OffersQuery::default().filter(), None);
        assert_eq!(bank.filter(), Some("bank"));
    }

    #[test]
    fn test_order_requires_contact_fields() {
        let order: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "service": "Расчётный счёт",
            "price": "0 ₽",
            "name": "",
            "phone": "+7 900 000-00-00",
            "email": "not-an-email"
        }))
        .unwrap();

        let errors = order.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("phone"));
    }

    #[test]
    fn test_column_lengths_are_enforced() {
        let order: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "service": "Расчётный счёт",
            "price": "0 ₽",
            "name": "Иван",
            "phone": "+7 900 000-00-00",
            "company": "О".repeat(256)
        }))
        .unwrap();
        let errors = order.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("company"));

        let update = UpdateUserRequest {
            phone: Some("9".repeat(33)),
            company_name: Some("ООО Ромашка".to_string()),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(!fields.contains_key("company_name"));

        let news: NewsPayload = serde_json::from_value(serde_json::json!({
            "title": "Новость",
            "badge": "Б".repeat(64)
        }))
        .unwrap();
        assert!(news.validate().is_ok());
    }

    #[test]
    fn test_empty_user_update_is_rejected() {
        assert!(UpdateUserRequest::default().validate().is_err());
        let update = UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_published_news_gets_a_date() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut payload: NewsPayload =
            serde_json::from_value(serde_json::json!({"title": "Новость"})).unwrap();
        assert_eq!(payload.status_or_draft(), NewsStatus::Draft);
        assert_eq!(payload.effective_published_date(today), None);

        payload.status = Some(NewsStatus::Published);
        assert_eq!(payload.effective_published_date(today), Some(today));
    }

    #[test]
    fn test_banner_window_validation() {
        let banner: BannerPayload = serde_json::from_value(serde_json::json!({
            "title": "Баннер",
            "imageUrl": "https://example.com/banner.jpg",
            "linkUrl": "https://alfabank.ru",
            "position": "top",
            "startDate": "2026-12-31",
            "endDate": "2026-01-01"
        }))
        .unwrap();
        assert_eq!(banner.priority, 5);
        assert!(banner.active);
        assert!(banner.validate().is_err());
    }
}
