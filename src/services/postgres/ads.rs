use chrono::NaiveDate;

use super::{PostgresClient, PostgresError};
use crate::models::{Ad, AdCategory, AdPayload, Banner, BannerPayload, BannerPosition};

const BANNER_COLUMNS: &str = "id, title, image_url, link_url, position, start_date, end_date, \
     priority, active, clicks, impressions, created_at";

const AD_COLUMNS: &str = "id, partner, title, description, category, price, old_price, features, \
     link_url, featured, active, created_at";

/// Counter bumped by the public banner tracking endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerCounter {
    Impression,
    Click,
}

impl BannerCounter {
    fn column(self) -> &'static str {
        match self {
            BannerCounter::Impression => "impressions",
            BannerCounter::Click => "clicks",
        }
    }
}

impl PostgresClient {
    /// Banners shown on `today`, highest priority first
    pub async fn live_banners(
        &self,
        position: Option<BannerPosition>,
        today: NaiveDate,
    ) -> Result<Vec<Banner>, PostgresError> {
        let query = format!(
            r#"
            SELECT {BANNER_COLUMNS}
            FROM banners
            WHERE active = TRUE
              AND ($1::banner_position IS NULL OR position = $1)
              AND (start_date IS NULL OR start_date <= $2)
              AND (end_date IS NULL OR end_date >= $2)
            ORDER BY priority DESC, created_at DESC
            "#
        );

        let banners = sqlx::query_as::<_, Banner>(&query)
            .bind(position)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;
        Ok(banners)
    }

    pub async fn list_all_banners(&self) -> Result<Vec<Banner>, PostgresError> {
        let query =
            format!("SELECT {BANNER_COLUMNS} FROM banners ORDER BY priority DESC, created_at DESC");
        let banners = sqlx::query_as::<_, Banner>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(banners)
    }

    pub async fn create_banner(&self, payload: &BannerPayload) -> Result<Banner, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO banners (title, image_url, link_url, position, start_date, end_date, priority, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BANNER_COLUMNS}
            "#
        );

        let banner = sqlx::query_as::<_, Banner>(&query)
            .bind(&payload.title)
            .bind(&payload.image_url)
            .bind(&payload.link_url)
            .bind(payload.position)
            .bind(payload.start_date)
            .bind(payload.end_date)
            .bind(payload.priority)
            .bind(payload.active)
            .fetch_one(&self.pool)
            .await?;
        Ok(banner)
    }

    pub async fn update_banner(
        &self,
        id: i32,
        payload: &BannerPayload,
    ) -> Result<Banner, PostgresError> {
        let query = format!(
            r#"
            UPDATE banners
            SET title = $1, image_url = $2, link_url = $3, position = $4, start_date = $5,
                end_date = $6, priority = $7, active = $8
            WHERE id = $9
            RETURNING {BANNER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Banner>(&query)
            .bind(&payload.title)
            .bind(&payload.image_url)
            .bind(&payload.link_url)
            .bind(payload.position)
            .bind(payload.start_date)
            .bind(payload.end_date)
            .bind(payload.priority)
            .bind(payload.active)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Banner {} not found", id)))
    }

    pub async fn delete_banner(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("Banner {} not found", id)));
        }
        Ok(())
    }

    pub async fn bump_banner_counter(
        &self,
        id: i32,
        counter: BannerCounter,
    ) -> Result<(), PostgresError> {
        let column = counter.column();
        let query = format!("UPDATE banners SET {column} = {column} + 1 WHERE id = $1");
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("Banner {} not found", id)));
        }
        Ok(())
    }

    /// Active ads, featured first
    pub async fn active_ads(&self, category: Option<AdCategory>) -> Result<Vec<Ad>, PostgresError> {
        let query = format!(
            r#"
            SELECT {AD_COLUMNS}
            FROM ads
            WHERE active = TRUE AND ($1::ad_category IS NULL OR category = $1)
            ORDER BY featured DESC, created_at DESC
            "#
        );

        let ads = sqlx::query_as::<_, Ad>(&query)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(ads)
    }

    pub async fn list_all_ads(&self) -> Result<Vec<Ad>, PostgresError> {
        let query = format!("SELECT {AD_COLUMNS} FROM ads ORDER BY featured DESC, created_at DESC");
        let ads = sqlx::query_as::<_, Ad>(&query).fetch_all(&self.pool).await?;
        Ok(ads)
    }

    pub async fn create_ad(&self, payload: &AdPayload) -> Result<Ad, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO ads (partner, title, description, category, price, old_price, features,
                             link_url, featured, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {AD_COLUMNS}
            "#
        );

        let ad = sqlx::query_as::<_, Ad>(&query)
            .bind(&payload.partner)
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(payload.category)
            .bind(&payload.price)
            .bind(&payload.old_price)
            .bind(&payload.features)
            .bind(&payload.link_url)
            .bind(payload.featured)
            .bind(payload.active)
            .fetch_one(&self.pool)
            .await?;
        Ok(ad)
    }

    pub async fn update_ad(&self, id: i32, payload: &AdPayload) -> Result<Ad, PostgresError> {
        let query = format!(
            r#"
            UPDATE ads
            SET partner = $1, title = $2, description = $3, category = $4, price = $5,
                old_price = $6, features = $7, link_url = $8, featured = $9, active = $10
            WHERE id = $11
            RETURNING {AD_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Ad>(&query)
            .bind(&payload.partner)
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(payload.category)
            .bind(&payload.price)
            .bind(&payload.old_price)
            .bind(&payload.features)
            .bind(&payload.link_url)
            .bind(payload.featured)
            .bind(payload.active)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("Ad {} not found", id)))
    }

    pub async fn delete_ad(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("Ad {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{test_client, unique};
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn banner(
        title: &str,
        position: BannerPosition,
        window: (Option<NaiveDate>, Option<NaiveDate>),
        priority: i32,
        active: bool,
    ) -> BannerPayload {
        BannerPayload {
            title: title.to_string(),
            image_url: "https://example.com/banner.jpg".to_string(),
            link_url: "https://alfabank.ru".to_string(),
            position,
            start_date: window.0,
            end_date: window.1,
            priority,
            active,
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_live_banners_respect_the_date_window() {
        let client = test_client().await;
        let run = unique("banner");
        let today = NaiveDate::from_ymd_opt(2031, 6, 1).unwrap();

        let fixtures = [
            ("in-window", BannerPosition::Top, (day(2031, 1, 1), day(2031, 12, 31)), 1, true),
            ("open-ended", BannerPosition::Top, (None, None), 9, true),
            ("ends-today", BannerPosition::Top, (None, day(2031, 6, 1)), 5, true),
            ("expired", BannerPosition::Top, (None, day(2031, 5, 31)), 5, true),
            ("upcoming", BannerPosition::Top, (day(2031, 7, 1), None), 5, true),
            ("inactive", BannerPosition::Top, (None, None), 5, false),
            ("sidebar", BannerPosition::Sidebar, (None, None), 5, true),
        ];

        let mut ids = Vec::new();
        for (name, position, window, priority, active) in fixtures {
            let title = format!("{run}-{name}");
            let created = client
                .create_banner(&banner(&title, position, window, priority, active))
                .await
                .unwrap();
            ids.push(created.id);
        }

        let ours = |banners: Vec<Banner>| -> Vec<String> {
            banners
                .into_iter()
                .filter_map(|b| b.title.strip_prefix(&format!("{run}-")).map(str::to_string))
                .collect()
        };

        let top = ours(client.live_banners(Some(BannerPosition::Top), today).await.unwrap());
        assert_eq!(top, vec!["open-ended", "ends-today", "in-window"]);

        let any = ours(client.live_banners(None, today).await.unwrap());
        assert_eq!(any.len(), 4);
        assert!(any.contains(&"sidebar".to_string()));

        client.bump_banner_counter(ids[0], BannerCounter::Click).await.unwrap();
        client.bump_banner_counter(ids[0], BannerCounter::Impression).await.unwrap();
        client.bump_banner_counter(ids[0], BannerCounter::Impression).await.unwrap();
        let bumped = client
            .list_all_banners()
            .await
            .unwrap()
            .into_iter()
            .find(|b| b.id == ids[0])
            .unwrap();
        assert_eq!((bumped.clicks, bumped.impressions), (1, 2));

        for id in ids {
            client.delete_banner(id).await.unwrap();
        }
        assert!(matches!(
            client.bump_banner_counter(-1, BannerCounter::Click).await,
            Err(PostgresError::NotFound(_))
        ));
    }
}
