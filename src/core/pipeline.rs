//! News automation: scrape the source, rewrite drafts with the language
//! model, publish ready articles to Telegram and VK.
//!
//! Every public step holds the pipeline guard for its whole duration, so a
//! manual trigger and a scheduled run never work on the same articles at once.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::config::Settings;
use crate::core::agent_log::AgentLog;
use crate::core::format::{telegram_post, vk_post};
use crate::core::scrape::{ScrapeError, ScrapeRules};
use crate::models::{NewsArticle, NewsStats, NewsStatus, ScrapedItem, TelegramChannel};
use crate::services::{
    AiClient, AiError, FetchError, PageFetcher, PostgresError, TelegramClient, TelegramError,
    VkClient, VkError,
};

/// Persistence needed by the pipeline
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn title_exists(&self, title: &str) -> Result<bool, PostgresError>;

    /// Insert a scraped item as a draft; returns the new id
    async fn insert_draft(&self, item: &ScrapedItem) -> Result<i32, PostgresError>;

    /// Newest articles with `status`, at most `limit`
    async fn fetch_by_status(
        &self,
        status: NewsStatus,
        limit: i64,
    ) -> Result<Vec<NewsArticle>, PostgresError>;

    async fn find_article(&self, id: i32) -> Result<Option<NewsArticle>, PostgresError>;

    async fn mark_ready(&self, id: i32, content: &str) -> Result<(), PostgresError>;

    /// Set status=published, keep an existing publication date, store channel ids
    async fn mark_published(
        &self,
        id: i32,
        on: NaiveDate,
        telegram_message_id: Option<i64>,
        vk_post_id: Option<i64>,
    ) -> Result<(), PostgresError>;

    async fn news_stats(&self) -> Result<NewsStats, PostgresError>;
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline is already running")]
    Busy,

    #[error("News {0} not found")]
    NotFound(i32),

    #[error("News {0} is already published")]
    AlreadyPublished(i32),

    #[error("No publishing channel is configured")]
    NoChannels,

    #[error("Publishing failed on every channel: {0}")]
    AllChannelsFailed(String),

    #[error("Database error: {0}")]
    Store(#[from] PostgresError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("VK error: {0}")]
    Vk(#[from] VkError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub success: bool,
    pub scraped: usize,
    pub saved: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub success: bool,
    pub processed: usize,
    pub failed: usize,
    pub total_drafts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub success: bool,
    pub published_telegram: usize,
    pub published_vk: usize,
    pub published: usize,
    pub total_ready: usize,
}

/// Result slot of one step inside an auto run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepOutcome<T> {
    Done(T),
    Failed { success: bool, error: String },
}

impl<T> StepOutcome<T> {
    fn from_result(result: Result<T, PipelineError>) -> Self {
        match result {
            Ok(report) => StepOutcome::Done(report),
            Err(e) => StepOutcome::Failed {
                success: false,
                error: e.to_string(),
            },
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSteps {
    pub scrape: StepOutcome<ScrapeReport>,
    pub process: StepOutcome<ProcessReport>,
    pub publish: StepOutcome<PublishReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoReport {
    /// True when every step completed
    pub success: bool,
    pub pipeline: PipelineSteps,
}

/// Where one article ended up
#[derive(Debug, Default)]
struct Delivery {
    telegram: Option<Result<i64, TelegramError>>,
    vk: Option<Result<i64, VkError>>,
}

impl Delivery {
    fn telegram_id(&self) -> Option<i64> {
        self.telegram.as_ref().and_then(|r| r.as_ref().ok().copied())
    }

    fn vk_id(&self) -> Option<i64> {
        self.vk.as_ref().and_then(|r| r.as_ref().ok().copied())
    }

    fn any_succeeded(&self) -> bool {
        self.telegram_id().is_some() || self.vk_id().is_some()
    }

    fn failures(&self) -> String {
        let mut failures = Vec::new();
        if let Some(Err(e)) = &self.telegram {
            failures.push(format!("telegram: {}", e));
        }
        if let Some(Err(e)) = &self.vk {
            failures.push(format!("vk: {}", e));
        }
        failures.join("; ")
    }
}

/// Something the scheduler can run on a timer
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    async fn run_auto(&self) -> Result<AutoReport, PipelineError>;

    fn is_busy(&self) -> bool;
}

pub struct NewsPipeline {
    store: Arc<dyn NewsStore>,
    fetcher: PageFetcher,
    rules: ScrapeRules,
    source_url: Url,
    ai: AiClient,
    telegram: TelegramClient,
    vk: VkClient,
    process_batch: i64,
    publish_batch: i64,
    log: Arc<AgentLog>,
    guard: Mutex<()>,
}

impl NewsPipeline {
    pub fn new(
        store: Arc<dyn NewsStore>,
        settings: &Settings,
        log: Arc<AgentLog>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            store,
            fetcher: PageFetcher::new(&settings.scraper)?,
            rules: ScrapeRules::from_settings(&settings.scraper)?,
            source_url: Url::parse(&settings.scraper.source_url).map_err(ScrapeError::from)?,
            ai: AiClient::new(&settings.ai)?,
            telegram: TelegramClient::new(&settings.telegram)?,
            vk: VkClient::new(&settings.vk)?,
            process_batch: settings.ai.batch_size.max(1),
            publish_batch: settings.scheduler.publish_batch.max(1),
            log,
            guard: Mutex::new(()),
        })
    }

    pub fn agent_log(&self) -> &AgentLog {
        &self.log
    }

    pub async fn stats(&self) -> Result<NewsStats, PipelineError> {
        Ok(self.store.news_stats().await?)
    }

    pub async fn telegram_channels(&self) -> Result<Vec<TelegramChannel>, PipelineError> {
        Ok(self.telegram.discover_channels().await?)
    }

    pub async fn scrape(&self) -> Result<ScrapeReport, PipelineError> {
        let _running = self.guard.try_lock().map_err(|_| PipelineError::Busy)?;
        self.logged("Scrape", self.scrape_inner().await)
    }

    pub async fn process(&self) -> Result<ProcessReport, PipelineError> {
        let _running = self.guard.try_lock().map_err(|_| PipelineError::Busy)?;
        self.logged("Processing", self.process_inner().await)
    }

    pub async fn publish(&self) -> Result<PublishReport, PipelineError> {
        let _running = self.guard.try_lock().map_err(|_| PipelineError::Busy)?;
        self.logged("Publishing", self.publish_inner().await)
    }

    /// Scrape, process and publish in order; a failed step does not stop the next one
    pub async fn auto(&self) -> Result<AutoReport, PipelineError> {
        let _running = self.guard.try_lock().map_err(|_| PipelineError::Busy)?;
        tracing::info!("Starting auto pipeline run");
        self.log.info("Auto run started");

        let scrape = StepOutcome::from_result(self.logged("Scrape", self.scrape_inner().await));
        let process =
            StepOutcome::from_result(self.logged("Processing", self.process_inner().await));
        let publish =
            StepOutcome::from_result(self.logged("Publishing", self.publish_inner().await));

        let success = scrape.is_done() && process.is_done() && publish.is_done();
        self.log.info(if success {
            "Auto run finished"
        } else {
            "Auto run finished with errors"
        });

        Ok(AutoReport {
            success,
            pipeline: PipelineSteps {
                scrape,
                process,
                publish,
            },
        })
    }

    /// Publish one article right away regardless of its status
    pub async fn publish_one(&self, id: i32) -> Result<NewsArticle, PipelineError> {
        let _running = self.guard.try_lock().map_err(|_| PipelineError::Busy)?;

        let article = self
            .store
            .find_article(id)
            .await?
            .ok_or(PipelineError::NotFound(id))?;
        if article.status == NewsStatus::Published {
            return Err(PipelineError::AlreadyPublished(id));
        }
        self.ensure_channels()?;

        let delivery = self.deliver(&article).await;
        if !delivery.any_succeeded() {
            let failures = delivery.failures();
            self.log.error(format!("Publishing '{}' failed: {}", article.title, failures));
            return Err(PipelineError::AllChannelsFailed(failures));
        }

        let today = Utc::now().date_naive();
        self.store
            .mark_published(id, today, delivery.telegram_id(), delivery.vk_id())
            .await?;
        self.log.info(format!("Published '{}'", article.title));

        self.store
            .find_article(id)
            .await?
            .ok_or(PipelineError::NotFound(id))
    }

    fn logged<T: std::fmt::Debug>(
        &self,
        step: &str,
        result: Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        match &result {
            Ok(report) => tracing::info!("{} finished: {:?}", step, report),
            Err(e) => {
                tracing::error!("{} failed: {}", step, e);
                self.log.error(format!("{} failed: {}", step, e));
            }
        }
        result
    }

    async fn scrape_inner(&self) -> Result<ScrapeReport, PipelineError> {
        let html = self.fetcher.fetch(self.source_url.as_str()).await?;
        let items = self.rules.extract(&html, &self.source_url);

        let mut saved = 0;
        for item in &items {
            if self.store.title_exists(&item.title).await? {
                tracing::debug!("Skipping known article '{}'", item.title);
                continue;
            }
            self.store.insert_draft(item).await?;
            saved += 1;
        }

        self.log.info(format!("Scraped {} items, saved {} new drafts", items.len(), saved));
        Ok(ScrapeReport {
            success: true,
            scraped: items.len(),
            saved,
        })
    }

    async fn process_inner(&self) -> Result<ProcessReport, PipelineError> {
        if !self.ai.is_configured() {
            return Err(AiError::NotConfigured.into());
        }

        let drafts = self
            .store
            .fetch_by_status(NewsStatus::Draft, self.process_batch)
            .await?;

        let mut processed = 0;
        let mut failed = 0;
        for draft in &drafts {
            let source = if draft.content.trim().is_empty() {
                draft.description.as_deref().unwrap_or("")
            } else {
                draft.content.as_str()
            };

            match self.ai.rewrite(&draft.title, source, draft.source_url.as_deref()).await {
                Ok(text) => {
                    self.store.mark_ready(draft.id, &text).await?;
                    processed += 1;
                }
                Err(e) => {
                    tracing::warn!("AI rewrite of news {} failed: {}", draft.id, e);
                    self.log.warn(format!("Rewrite of '{}' failed: {}", draft.title, e));
                    failed += 1;
                }
            }
        }

        self.log.info(format!(
            "Processed {} of {} drafts ({} failed)",
            processed,
            drafts.len(),
            failed
        ));
        Ok(ProcessReport {
            success: true,
            processed,
            failed,
            total_drafts: drafts.len(),
        })
    }

    async fn publish_inner(&self) -> Result<PublishReport, PipelineError> {
        self.ensure_channels()?;

        let ready = self
            .store
            .fetch_by_status(NewsStatus::Ready, self.publish_batch)
            .await?;
        let today = Utc::now().date_naive();

        let mut report = PublishReport {
            success: true,
            total_ready: ready.len(),
            ..PublishReport::default()
        };

        for article in &ready {
            let delivery = self.deliver(article).await;
            if delivery.telegram_id().is_some() {
                report.published_telegram += 1;
            }
            if delivery.vk_id().is_some() {
                report.published_vk += 1;
            }

            if delivery.any_succeeded() {
                self.store
                    .mark_published(article.id, today, delivery.telegram_id(), delivery.vk_id())
                    .await?;
                report.published += 1;
            } else {
                tracing::warn!("News {} was not published: {}", article.id, delivery.failures());
                self.log.warn(format!(
                    "Publishing '{}' failed: {}",
                    article.title,
                    delivery.failures()
                ));
            }
        }

        self.log.info(format!(
            "Published {} of {} ready articles (telegram {}, vk {})",
            report.published, report.total_ready, report.published_telegram, report.published_vk
        ));
        Ok(report)
    }

    fn ensure_channels(&self) -> Result<(), PipelineError> {
        if !self.telegram.is_configured() && !self.vk.is_configured() {
            return Err(PipelineError::NoChannels);
        }
        Ok(())
    }

    /// Post to every configured channel; unconfigured channels are skipped
    async fn deliver(&self, article: &NewsArticle) -> Delivery {
        let mut delivery = Delivery::default();

        if self.telegram.is_configured() {
            let post = telegram_post(article);
            let sent = match &post.photo_url {
                Some(photo) => self.telegram.send_photo(photo, &post.text).await,
                None => self.telegram.send_message(&post.text).await,
            };
            if let Err(e) = &sent {
                tracing::warn!("Telegram rejected news {}: {}", article.id, e);
            }
            delivery.telegram = Some(sent);
        }

        if self.vk.is_configured() {
            let sent = self
                .vk
                .wall_post(&vk_post(article), article.source_url.as_deref())
                .await;
            if let Err(e) = &sent {
                tracing::warn!("VK rejected news {}: {}", article.id, e);
            }
            delivery.vk = Some(sent);
        }

        delivery
    }
}

#[async_trait]
impl PipelineRunner for NewsPipeline {
    async fn run_auto(&self) -> Result<AutoReport, PipelineError> {
        self.auto().await
    }

    fn is_busy(&self) -> bool {
        self.guard.try_lock().is_err()
    }
}
