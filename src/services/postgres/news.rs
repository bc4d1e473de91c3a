use async_trait::async_trait;
use chrono::NaiveDate;

use super::{PostgresClient, PostgresError};
use crate::core::pipeline::NewsStore;
use crate::models::{NewsArticle, NewsPayload, NewsStats, NewsStatus, ScrapedItem};

const NEWS_COLUMNS: &str = "id, title, description, content, badge, source_url, image_url, \
     status, published_date, telegram_message_id, vk_post_id, created_at, updated_at";

impl PostgresClient {
    /// Page of published articles plus the total number of published articles
    pub async fn published_news_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<NewsArticle>, i64), PostgresError> {
        let query = format!(
            r#"
            SELECT {NEWS_COLUMNS}
            FROM news_articles
            WHERE status = 'published'
            ORDER BY published_date DESC NULLS LAST, created_at DESC
            LIMIT $1 OFFSET $2
            "#
        );

        let news = sqlx::query_as::<_, NewsArticle>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM news_articles WHERE status = 'published'")
                .fetch_one(&self.pool)
                .await?;

        Ok((news, total))
    }

    pub async fn published_article(&self, id: i32) -> Result<NewsArticle, PostgresError> {
        let query =
            format!("SELECT {NEWS_COLUMNS} FROM news_articles WHERE id = $1 AND status = 'published'");
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("News {} not found", id)))
    }

    pub async fn list_news(
        &self,
        status: Option<NewsStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NewsArticle>, PostgresError> {
        let query = format!(
            r#"
            SELECT {NEWS_COLUMNS}
            FROM news_articles
            WHERE ($1::news_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let news = sqlx::query_as::<_, NewsArticle>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(news)
    }

    pub async fn create_news(
        &self,
        payload: &NewsPayload,
        today: NaiveDate,
    ) -> Result<i32, PostgresError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO news_articles
                (title, description, content, badge, source_url, image_url, status, published_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(payload.title.trim())
        .bind(&payload.description)
        .bind(&payload.content)
        .bind(&payload.badge)
        .bind(&payload.source_url)
        .bind(&payload.image_url)
        .bind(payload.status_or_draft())
        .bind(payload.effective_published_date(today))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created news {} ({})", id, payload.status_or_draft().as_str());
        Ok(id)
    }

    pub async fn update_news(
        &self,
        id: i32,
        payload: &NewsPayload,
        today: NaiveDate,
    ) -> Result<NewsArticle, PostgresError> {
        let query = format!(
            r#"
            UPDATE news_articles
            SET title = $1, description = $2, content = $3, badge = $4, source_url = $5,
                image_url = $6, status = $7, published_date = $8, updated_at = NOW()
            WHERE id = $9
            RETURNING {NEWS_COLUMNS}
            "#
        );

        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(payload.title.trim())
            .bind(&payload.description)
            .bind(&payload.content)
            .bind(&payload.badge)
            .bind(&payload.source_url)
            .bind(&payload.image_url)
            .bind(payload.status_or_draft())
            .bind(payload.effective_published_date(today))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("News {} not found", id)))
    }

    pub async fn delete_news(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM news_articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("News {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl NewsStore for PostgresClient {
    async fn title_exists(&self, title: &str) -> Result<bool, PostgresError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM news_articles WHERE title = $1)")
                .bind(title)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_draft(&self, item: &ScrapedItem) -> Result<i32, PostgresError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO news_articles
                (title, description, content, source_url, image_url, status, published_date)
            VALUES ($1, $2, $2, $3, $4, 'draft', $5)
            RETURNING id
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.source_url)
        .bind(&item.image_url)
        .bind(item.published_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch_by_status(
        &self,
        status: NewsStatus,
        limit: i64,
    ) -> Result<Vec<NewsArticle>, PostgresError> {
        self.list_news(Some(status), limit, 0).await
    }

    async fn find_article(&self, id: i32) -> Result<Option<NewsArticle>, PostgresError> {
        let query = format!("SELECT {NEWS_COLUMNS} FROM news_articles WHERE id = $1");
        let article = sqlx::query_as::<_, NewsArticle>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn mark_ready(&self, id: i32, content: &str) -> Result<(), PostgresError> {
        sqlx::query(
            "UPDATE news_articles SET content = $1, status = 'ready', updated_at = NOW() WHERE id = $2",
        )
        .bind(content)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_published(
        &self,
        id: i32,
        on: NaiveDate,
        telegram_message_id: Option<i64>,
        vk_post_id: Option<i64>,
    ) -> Result<(), PostgresError> {
        sqlx::query(
            r#"
            UPDATE news_articles
            SET status = 'published',
                published_date = COALESCE(published_date, $1),
                telegram_message_id = COALESCE($2, telegram_message_id),
                vk_post_id = COALESCE($3, vk_post_id),
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(on)
        .bind(telegram_message_id)
        .bind(vk_post_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn news_stats(&self) -> Result<NewsStats, PostgresError> {
        let rows: Vec<(NewsStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM news_articles GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        Ok(NewsStats::from_counts(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{test_client, unique};
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payload(title: &str, status: NewsStatus, published_date: Option<NaiveDate>) -> NewsPayload {
        NewsPayload {
            title: title.to_string(),
            description: Some("Описание".to_string()),
            content: "Текст новости".to_string(),
            badge: None,
            source_url: None,
            image_url: None,
            status: Some(status),
            published_date,
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_published_page_orders_by_date_with_undated_last() {
        let client = test_client().await;
        let today = day(2026, 10, 16);

        let older = client
            .create_news(&payload(&unique("older"), NewsStatus::Published, Some(day(2999, 1, 1))), today)
            .await
            .unwrap();
        let newer = client
            .create_news(&payload(&unique("newer"), NewsStatus::Published, Some(day(2999, 2, 1))), today)
            .await
            .unwrap();
        let draft = client
            .create_news(&payload(&unique("draft"), NewsStatus::Draft, Some(day(2999, 3, 1))), today)
            .await
            .unwrap();
        let undated: i32 = sqlx::query_scalar(
            "INSERT INTO news_articles (title, status) VALUES ($1, 'published') RETURNING id",
        )
        .bind(unique("undated"))
        .fetch_one(&client.pool)
        .await
        .unwrap();

        let (_, total) = client.published_news_page(1, 0).await.unwrap();
        assert!(total >= 3);
        let (page, _) = client.published_news_page(total + 50, 0).await.unwrap();
        assert!(page.iter().all(|a| a.status == NewsStatus::Published));
        assert!(page.iter().all(|a| a.id != draft));
        assert!(page.windows(2).all(|pair| match (pair[0].published_date, pair[1].published_date) {
            (Some(a), Some(b)) => a >= b,
            (None, Some(_)) => false,
            _ => true,
        }));
        let position = |id: i32| page.iter().position(|a| a.id == id).unwrap();
        assert!(position(newer) < position(older));
        assert!(position(older) < position(undated));

        let (first, _) = client.published_news_page(1, 0).await.unwrap();
        let (second, _) = client.published_news_page(1, 1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_ne!(first[0].id, second[0].id);

        assert!(matches!(
            client.published_article(draft).await,
            Err(PostgresError::NotFound(_))
        ));
        assert_eq!(client.published_article(undated).await.unwrap().id, undated);

        for id in [older, newer, draft, undated] {
            client.delete_news(id).await.unwrap();
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_mark_published_keeps_an_existing_date() {
        let client = test_client().await;
        let title = unique("Новость источника");

        let id = client
            .insert_draft(&ScrapedItem {
                title: title.clone(),
                description: "Описание с сайта".to_string(),
                source_url: Some("https://sberanalytics.ru/news/1".to_string()),
                image_url: None,
                published_date: Some(day(2024, 5, 1)),
            })
            .await
            .unwrap();
        assert!(client.title_exists(&title).await.unwrap());

        let draft = client.find_article(id).await.unwrap().unwrap();
        assert_eq!(draft.status, NewsStatus::Draft);
        assert_eq!(draft.content, "Описание с сайта");

        client.mark_ready(id, "Переписанный текст").await.unwrap();
        client.mark_published(id, day(2026, 10, 16), Some(77), None).await.unwrap();
        client.mark_published(id, day(2026, 10, 17), None, Some(5)).await.unwrap();

        let published = client.find_article(id).await.unwrap().unwrap();
        assert_eq!(published.status, NewsStatus::Published);
        assert_eq!(published.content, "Переписанный текст");
        assert_eq!(published.published_date, Some(day(2024, 5, 1)));
        assert_eq!(published.telegram_message_id, Some(77));
        assert_eq!(published.vk_post_id, Some(5));

        let undated = client
            .insert_draft(&ScrapedItem {
                title: unique("Без даты"),
                description: String::new(),
                source_url: None,
                image_url: None,
                published_date: None,
            })
            .await
            .unwrap();
        client.mark_published(undated, day(2026, 10, 16), None, None).await.unwrap();
        let stamped = client.find_article(undated).await.unwrap().unwrap();
        assert_eq!(stamped.published_date, Some(day(2026, 10, 16)));

        client.delete_news(id).await.unwrap();
        client.delete_news(undated).await.unwrap();
    }
}
