use super::{PostgresClient, PostgresError};
use crate::models::{PartnerOffer, PartnerOfferPayload, Service, ServicePayload};

const SERVICE_COLUMNS: &str =
    "id, title, description, price, icon, icon_url, features, created_at, updated_at";

const OFFER_COLUMNS: &str = "id, category, partner, partner_logo, title, description, price, \
     old_price, features, rating, reviews, created_at, updated_at";

impl PostgresClient {
    pub async fn list_services(&self) -> Result<Vec<Service>, PostgresError> {
        let query = format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY created_at DESC, id DESC");
        let services = sqlx::query_as::<_, Service>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(services)
    }

    pub async fn create_service(&self, payload: &ServicePayload) -> Result<Service, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO services (title, description, price, icon, icon_url, features)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SERVICE_COLUMNS}
            "#
        );

        let service = sqlx::query_as::<_, Service>(&query)
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(&payload.price)
            .bind(payload.icon_or_default())
            .bind(&payload.icon_url)
            .bind(&payload.features)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created service {} ({})", service.id, service.title);
        Ok(service)
    }

    pub async fn update_service(
        &self,
        id: i32,
        payload: &ServicePayload,
    ) -> Result<Service, PostgresError> {
        let query = format!(
            r#"
            UPDATE services
            SET title = $1, description = $2, price = $3, icon = $4, icon_url = $5,
                features = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {SERVICE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Service>(&query)
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(&payload.price)
            .bind(payload.icon_or_default())
            .bind(&payload.icon_url)
            .bind(&payload.features)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Service {} not found", id)))
    }

    pub async fn delete_service(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("Service {} not found", id)));
        }
        Ok(())
    }

    /// List partner offers, optionally restricted to one category
    pub async fn list_partner_offers(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<PartnerOffer>, PostgresError> {
        let query = format!(
            r#"
            SELECT {OFFER_COLUMNS}
            FROM partner_offers
            WHERE ($1::TEXT IS NULL OR category = $1)
            ORDER BY created_at DESC, id DESC
            "#
        );

        let offers = sqlx::query_as::<_, PartnerOffer>(&query)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(offers)
    }

    pub async fn create_partner_offer(
        &self,
        payload: &PartnerOfferPayload,
    ) -> Result<PartnerOffer, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO partner_offers
                (category, partner, partner_logo, title, description, price, old_price,
                 features, rating, reviews)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {OFFER_COLUMNS}
            "#
        );

        let offer = sqlx::query_as::<_, PartnerOffer>(&query)
            .bind(&payload.category)
            .bind(&payload.partner)
            .bind(payload.logo_or_default())
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(&payload.price)
            .bind(&payload.old_price)
            .bind(&payload.features)
            .bind(payload.rating.unwrap_or(0.0))
            .bind(payload.reviews.unwrap_or(0))
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created partner offer {} ({} / {})", offer.id, offer.partner, offer.title);
        Ok(offer)
    }

    pub async fn update_partner_offer(
        &self,
        id: i32,
        payload: &PartnerOfferPayload,
    ) -> Result<PartnerOffer, PostgresError> {
        let query = format!(
            r#"
            UPDATE partner_offers
            SET category = $1, partner = $2, partner_logo = $3, title = $4, description = $5,
                price = $6, old_price = $7, features = $8, rating = $9, reviews = $10,
                updated_at = NOW()
            WHERE id = $11
            RETURNING {OFFER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, PartnerOffer>(&query)
            .bind(&payload.category)
            .bind(&payload.partner)
            .bind(payload.logo_or_default())
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(&payload.price)
            .bind(&payload.old_price)
            .bind(&payload.features)
            .bind(payload.rating.unwrap_or(0.0))
            .bind(payload.reviews.unwrap_or(0))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Partner offer {} not found", id)))
    }

    pub async fn delete_partner_offer(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM partner_offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("Partner offer {} not found", id)));
        }
        Ok(())
    }
}
