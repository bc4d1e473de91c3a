use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::VkSettings;

/// Errors that can occur when talking to the VK API
#[derive(Debug, Error)]
pub enum VkError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("VK access token or group id is not configured")]
    NotConfigured,

    #[error("VK API error {code}: {message}")]
    ApiError { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// VK API client posting to the community wall
pub struct VkClient {
    api_base: String,
    access_token: Option<String>,
    group_id: Option<String>,
    api_version: String,
    client: Client,
}

impl VkClient {
    pub fn new(settings: &VkSettings) -> Result<Self, VkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            access_token: settings.access_token.clone().filter(|t| !t.is_empty()),
            group_id: settings
                .group_id
                .as_deref()
                .map(|g| g.trim().trim_start_matches('-').to_string())
                .filter(|g| !g.is_empty()),
            api_version: settings.api_version.clone(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() && self.group_id.is_some()
    }

    /// Publish a post on behalf of the community; returns the post id
    pub async fn wall_post(&self, message: &str, link: Option<&str>) -> Result<i64, VkError> {
        let (Some(token), Some(group_id)) = (&self.access_token, &self.group_id) else {
            return Err(VkError::NotConfigured);
        };

        let owner_id = format!("-{}", group_id);
        let mut form: Vec<(&str, &str)> = vec![
            ("owner_id", owner_id.as_str()),
            ("from_group", "1"),
            ("message", message),
            ("access_token", token.as_str()),
            ("v", self.api_version.as_str()),
        ];
        if let Some(link) = link {
            form.push(("attachments", link));
        }

        let url = format!("{}/wall.post", self.api_base);
        tracing::debug!("Posting to VK wall {}", owner_id);

        let json: Value = self.client.post(&url).form(&form).send().await?.json().await?;

        if let Some(error) = json.get("error") {
            return Err(VkError::ApiError {
                code: error.get("error_code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("error_msg")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        json.get("response")
            .and_then(|r| r.get("post_id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| VkError::InvalidResponse("Missing response.post_id".into()))
    }
}
