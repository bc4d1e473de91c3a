use chrono::{DateTime, Utc};

use super::{PostgresClient, PostgresError};
use crate::models::{
    ActionCount, LogActionRequest, OfferViews, ServicePopularity, ServiceViews, UserAction,
    UserActivitySummary, UserProfileSummary, UserReport,
};

const ACTIONS_LIMIT: i64 = 100;
const TOP_LIMIT: i64 = 5;

impl PostgresClient {
    pub async fn log_action(
        &self,
        action: &LogActionRequest,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(i64, DateTime<Utc>), PostgresError> {
        let metadata = action
            .metadata
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));

        let row: (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO user_actions
                (user_id, action_type, action_description, page_url, service_id,
                 partner_offer_id, metadata, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            "#,
        )
        .bind(action.user_id)
        .bind(&action.action_type)
        .bind(&action.action_description)
        .bind(&action.page_url)
        .bind(action.service_id)
        .bind(action.partner_offer_id)
        .bind(metadata)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Logged action {} ({})", row.0, action.action_type);
        Ok(row)
    }

    /// Latest actions, optionally filtered by user and type
    pub async fn list_actions(
        &self,
        user_id: Option<i32>,
        action_type: Option<&str>,
    ) -> Result<Vec<UserAction>, PostgresError> {
        let actions = sqlx::query_as::<_, UserAction>(
            r#"
            SELECT id, user_id, action_type, action_description, page_url, service_id,
                   partner_offer_id, metadata, ip_address, user_agent, created_at
            FROM user_actions
            WHERE ($1::INTEGER IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR action_type = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(action_type)
        .bind(ACTIONS_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(actions)
    }

    pub async fn users_activity_report(&self) -> Result<Vec<UserActivitySummary>, PostgresError> {
        let rows = sqlx::query_as::<_, UserActivitySummary>(
            r#"
            SELECT u.id, u.email, u.full_name, u.company_name, u.created_at, u.last_login,
                   COUNT(DISTINCT ua.id) AS total_actions,
                   COUNT(DISTINCT CASE WHEN ua.action_type = 'submit_order' THEN ua.id END) AS orders_count,
                   MAX(ua.created_at) AS last_activity
            FROM users u
            LEFT JOIN user_actions ua ON u.id = ua.user_id
            WHERE u.is_active = TRUE
            GROUP BY u.id
            ORDER BY total_actions DESC, u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn user_report(&self, user_id: i32) -> Result<UserReport, PostgresError> {
        let profile = sqlx::query_as::<_, UserProfileSummary>(
            r#"
            SELECT u.id, u.email, u.full_name, u.phone, u.company_name, u.created_at, u.last_login,
                   COUNT(DISTINCT ua.id) AS total_actions,
                   COUNT(DISTINCT CASE WHEN ua.action_type = 'view_service' THEN ua.service_id END) AS viewed_services,
                   COUNT(DISTINCT CASE WHEN ua.action_type = 'view_offer' THEN ua.partner_offer_id END) AS viewed_offers,
                   COUNT(DISTINCT CASE WHEN ua.action_type = 'submit_order' THEN ua.id END) AS orders_count,
                   MAX(ua.created_at) AS last_activity
            FROM users u
            LEFT JOIN user_actions ua ON u.id = ua.user_id
            WHERE u.id = $1
            GROUP BY u.id
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PostgresError::NotFound(format!("User {} not found", user_id)))?;

        let action_stats = sqlx::query_as::<_, ActionCount>(
            r#"
            SELECT action_type, COUNT(*) AS count
            FROM user_actions
            WHERE user_id = $1
            GROUP BY action_type
            ORDER BY count DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let top_services = sqlx::query_as::<_, ServiceViews>(
            r#"
            SELECT s.title AS service_name, COUNT(*) AS views
            FROM user_actions ua
            JOIN services s ON ua.service_id = s.id
            WHERE ua.user_id = $1 AND ua.action_type = 'view_service'
            GROUP BY s.id, s.title
            ORDER BY views DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(TOP_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let top_offers = sqlx::query_as::<_, OfferViews>(
            r#"
            SELECT po.title AS offer_name, po.partner, COUNT(*) AS views
            FROM user_actions ua
            JOIN partner_offers po ON ua.partner_offer_id = po.id
            WHERE ua.user_id = $1 AND ua.action_type = 'view_offer'
            GROUP BY po.id, po.title, po.partner
            ORDER BY views DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(TOP_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserReport {
            profile,
            action_stats,
            top_services,
            top_offers,
        })
    }

    pub async fn popular_services(&self) -> Result<Vec<ServicePopularity>, PostgresError> {
        let rows = sqlx::query_as::<_, ServicePopularity>(
            r#"
            SELECT s.id, s.title, s.price,
                   COUNT(ua.id) AS view_count,
                   COUNT(DISTINCT ua.user_id) AS unique_users
            FROM services s
            LEFT JOIN user_actions ua
                ON s.id = ua.service_id AND ua.action_type = 'view_service'
            GROUP BY s.id
            ORDER BY view_count DESC, s.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{test_client, unique, NewUser};
    use super::*;
    use crate::error::ApiError;
    use crate::models::ServicePayload;
    use actix_web::ResponseError;

    fn action(user_id: Option<i32>, action_type: &str, service_id: Option<i32>) -> LogActionRequest {
        LogActionRequest {
            user_id,
            action_type: action_type.to_string(),
            action_description: None,
            page_url: Some("/services".to_string()),
            service_id,
            partner_offer_id: None,
            metadata: None,
            ip_address: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_user_report_and_popular_services() {
        let client = test_client().await;
        assert!(matches!(client.user_report(-1).await, Err(PostgresError::NotFound(_))));

        let email = format!("{}@example.com", unique("report"));
        let user = client
            .create_user(NewUser {
                email: &email,
                password_hash: "hash",
                full_name: "Мария",
                phone: None,
                company_name: None,
            })
            .await
            .unwrap();
        let service = client
            .create_service(&ServicePayload {
                title: unique("Аудит"),
                description: "Аудит отдела продаж".to_string(),
                price: "от 10 000 ₽".to_string(),
                icon: None,
                icon_url: None,
                features: vec![],
            })
            .await
            .unwrap();

        for action_type in ["view_service", "view_service", "submit_order"] {
            let service_id = (action_type == "view_service").then_some(service.id);
            client
                .log_action(&action(Some(user.id), action_type, service_id), Some("10.0.0.1"), None)
                .await
                .unwrap();
        }
        client
            .log_action(&action(None, "view_service", Some(service.id)), None, None)
            .await
            .unwrap();

        let report = client.user_report(user.id).await.unwrap();
        assert_eq!(report.profile.total_actions, 3);
        assert_eq!(report.profile.viewed_services, 1);
        assert_eq!(report.profile.orders_count, 1);
        assert!(report.profile.last_activity.is_some());
        assert_eq!(report.action_stats[0].action_type, "view_service");
        assert_eq!(report.action_stats[0].count, 2);
        assert_eq!(report.top_services[0].service_name, service.title);
        assert_eq!(report.top_services[0].views, 2);
        assert!(report.top_offers.is_empty());

        let actions = client.list_actions(Some(user.id), Some("submit_order")).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].ip_address.as_deref(), Some("10.0.0.1"));

        let popular = client.popular_services().await.unwrap();
        assert!(popular.windows(2).all(|pair| pair[0].view_count >= pair[1].view_count));
        let row = popular.iter().find(|s| s.id == service.id).unwrap();
        assert_eq!(row.view_count, 3);
        assert_eq!(row.unique_users, 1);

        client.delete_service(service.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_unknown_reference_is_a_bad_request() {
        let client = test_client().await;

        let err = client
            .log_action(&action(Some(i32::MAX), "view_service", None), None, None)
            .await
            .unwrap_err();
        let api: ApiError = err.into();
        assert_eq!(api.status_code().as_u16(), 400);
        assert_eq!(api.to_string(), "Referenced record does not exist");
    }
}
