use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::ScraperSettings;

/// Errors that can occur when downloading the news source page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Source returned status {0}")]
    Status(u16),
}

/// Downloads HTML pages for the scraper
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(settings: &ScraperSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/products")
            .with_status(503)
            .create_async()
            .await;

        let fetcher = PageFetcher::new(&ScraperSettings::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/products", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }
}
