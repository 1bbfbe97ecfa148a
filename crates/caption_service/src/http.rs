//! Chat-completions style captioning over HTTP.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::{CaptionBackend, CaptionRequest, DEFAULT_CAPTION_TIMEOUT};

#[derive(Debug, Clone)]
pub struct HttpCaptionConfig {
    pub endpoint: Url,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl HttpCaptionConfig {
    pub fn new(endpoint: Url, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key,
            model: model.into(),
            timeout: DEFAULT_CAPTION_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpCaptionBackend {
    http: Client,
    config: HttpCaptionConfig,
}

impl HttpCaptionBackend {
    pub fn new(config: HttpCaptionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build caption http client")?;
        Ok(Self { http, config })
    }

    fn build_body<'a>(&'a self, request: &CaptionRequest) -> ChatCompletionRequest<'a> {
        let data_url = format!(
            "data:image/jpeg;base64,{}",
            STANDARD.encode(request.image.jpeg_bytes())
        );
        ChatCompletionRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: request.prompt(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl CaptionBackend for HttpCaptionBackend {
    async fn caption(&self, request: &CaptionRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("missing caption API key"))?;

        let response: ChatCompletionResponse = self
            .http
            .post(self.config.endpoint.clone())
            .bearer_auth(api_key)
            .json(&self.build_body(request))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed caption response body")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("caption response contained no message content"))?;

        info!(
            language = %request.language,
            model = %self.config.model,
            "caption: remote caption received"
        );
        Ok(text)
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
