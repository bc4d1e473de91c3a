use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::TelegramSettings;
use crate::models::TelegramChannel;

/// Errors that can occur when talking to the Telegram Bot API
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Telegram bot token or channel id is not configured")]
    NotConfigured,

    #[error("Telegram API error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Telegram Bot API client posting into the news channel
pub struct TelegramClient {
    api_base: String,
    bot_token: Option<String>,
    channel_id: Option<String>,
    client: Client,
}

impl TelegramClient {
    pub fn new(settings: &TelegramSettings) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            bot_token: settings.bot_token.clone().filter(|t| !t.is_empty()),
            channel_id: settings.channel_id.clone().filter(|c| !c.is_empty()),
            client,
        })
    }

    /// Whether posting is possible at all
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.channel_id.is_some()
    }

    fn method_url(&self, method: &str) -> Result<String, TelegramError> {
        let token = self.bot_token.as_deref().ok_or(TelegramError::NotConfigured)?;
        Ok(format!("{}/bot{}/{}", self.api_base, token, method))
    }

    fn channel(&self) -> Result<&str, TelegramError> {
        self.channel_id.as_deref().ok_or(TelegramError::NotConfigured)
    }

    /// Post an HTML text message; returns the message id
    pub async fn send_message(&self, text: &str) -> Result<i64, TelegramError> {
        let body = json!({
            "chat_id": self.channel()?,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": false,
        });
        let result = self.call("sendMessage", &body).await?;
        message_id(&result)
    }

    /// Post a photo by URL with an HTML caption; returns the message id
    pub async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<i64, TelegramError> {
        let body = json!({
            "chat_id": self.channel()?,
            "photo": photo_url,
            "caption": caption,
            "parse_mode": "HTML",
        });
        let result = self.call("sendPhoto", &body).await?;
        message_id(&result)
    }

    /// Channels the bot has seen in its recent updates
    pub async fn discover_channels(&self) -> Result<Vec<TelegramChannel>, TelegramError> {
        let url = self.method_url("getUpdates")?;
        let response = self.client.get(&url).send().await?;
        let json: Value = response.json().await?;
        let updates = unwrap_result(json)?;
        Ok(channels_from_updates(&updates))
    }

    async fn call(&self, method: &str, body: &Value) -> Result<Value, TelegramError> {
        let url = self.method_url(method)?;
        tracing::debug!("Calling Telegram method {}", method);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let json: Value = response.json().await.map_err(|e| {
            TelegramError::InvalidResponse(format!("{} returned {}: {}", method, status, e))
        })?;
        unwrap_result(json)
    }
}

/// Unwrap the `{ok, result, description}` envelope
fn unwrap_result(json: Value) -> Result<Value, TelegramError> {
    if json.get("ok").and_then(Value::as_bool) != Some(true) {
        let description = json
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(TelegramError::ApiError(description.to_string()));
    }
    json.get("result")
        .cloned()
        .ok_or_else(|| TelegramError::InvalidResponse("Missing result".into()))
}

fn message_id(result: &Value) -> Result<i64, TelegramError> {
    result
        .get("message_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| TelegramError::InvalidResponse("Missing message_id".into()))
}

/// Unique channel chats found in a `getUpdates` result
pub fn channels_from_updates(updates: &Value) -> Vec<TelegramChannel> {
    let mut channels: Vec<TelegramChannel> = Vec::new();

    for update in updates.as_array().into_iter().flatten() {
        let chat = ["message", "channel_post", "my_chat_member"]
            .iter()
            .find_map(|kind| update.get(*kind).and_then(|u| u.get("chat")));

        let Some(chat) = chat else { continue };
        if chat.get("type").and_then(Value::as_str) != Some("channel") {
            continue;
        }
        let Some(id) = chat.get("id").and_then(Value::as_i64) else { continue };
        if channels.iter().any(|c| c.id == id) {
            continue;
        }

        channels.push(TelegramChannel {
            id,
            title: chat
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Без названия")
                .to_string(),
            username: chat
                .get("username")
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
                .map(|u| format!("@{}", u)),
        });
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_base: String) -> TelegramSettings {
        TelegramSettings {
            api_base,
            bot_token: Some("123:abc".to_string()),
            channel_id: Some("-1001".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_channels_are_unique_and_channel_only() {
        let updates = json!([
            {"channel_post": {"chat": {"id": -100123, "type": "channel", "title": "Купец", "username": "kupets"}}},
            {"channel_post": {"chat": {"id": -100123, "type": "channel", "title": "Купец"}}},
            {"message": {"chat": {"id": 42, "type": "private"}}},
            {"my_chat_member": {"chat": {"id": -100456, "type": "channel"}}}
        ]);

        let channels = channels_from_updates(&updates);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].username.as_deref(), Some("@kupets"));
        assert_eq!(channels[1].title, "Без названия");
        assert_eq!(channels[1].username, None);
    }

    #[test]
    fn test_unconfigured_client() {
        let client = TelegramClient::new(&TelegramSettings::default()).unwrap();
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn test_send_message_returns_message_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":77}}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(&settings(server.url())).unwrap();
        let id = client.send_message("<b>Привет</b>").await.unwrap();

        assert_eq!(id, 77);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_carries_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/bot123:abc/sendPhoto")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(&settings(server.url())).unwrap();
        let err = client.send_photo("https://example.com/a.png", "x").await.unwrap_err();
        assert!(matches!(err, TelegramError::ApiError(ref d) if d.contains("chat not found")));
    }
}
