use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::AiSettings;

/// Errors that can occur when calling the language model endpoint
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("AI API key is not configured")]
    NotConfigured,

    #[error("AI API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("AI returned an empty answer")]
    EmptyAnswer,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatAnswer,
}

#[derive(Debug, Deserialize)]
struct ChatAnswer {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct AiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    client: Client,
}

impl AiClient {
    pub fn new(settings: &AiSettings) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            system_prompt: settings.system_prompt.clone(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Rewrite a scraped article into a short channel post
    pub async fn rewrite(
        &self,
        title: &str,
        content: &str,
        source_url: Option<&str>,
    ) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;

        let prompt = format!(
            "Заголовок: {}\n\nОписание: {}\n\nСсылка: {}",
            title,
            content,
            source_url.unwrap_or("")
        );
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let answer: ChatResponse = response.json().await?;
        answer
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(AiError::EmptyAnswer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn settings(base_url: String) -> AiSettings {
        AiSettings {
            base_url,
            api_key: Some("sk-test".to_string()),
            ..AiSettings::default()
        }
    }

    #[tokio::test]
    async fn test_rewrite_sends_model_and_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "openai/gpt-4o-mini",
                "max_tokens": 300
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  🚀 Новый продукт!  "}}]}"#)
            .create_async()
            .await;

        let client = AiClient::new(&settings(server.url())).unwrap();
        let text = client.rewrite("Продукт", "Описание", None).await.unwrap();

        assert_eq!(text, "🚀 Новый продукт!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":""}}]}"#)
            .create_async()
            .await;

        let client = AiClient::new(&settings(server.url())).unwrap();
        let err = client.rewrite("Продукт", "Описание", None).await.unwrap_err();
        assert!(matches!(err, AiError::EmptyAnswer));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = AiClient::new(&AiSettings::default()).unwrap();
        assert!(matches!(
            client.rewrite("a", "b", None).await,
            Err(AiError::NotConfigured)
        ));
    }
}
