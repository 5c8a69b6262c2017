//! Chat-completions client for OpenAI-compatible endpoints.

use std::time::Instant;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{NarrationError, Narrator, PromptTurn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Narrates by calling `POST {base_url}/chat/completions`.
#[derive(Clone)]
pub struct OpenAiNarrator {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiNarrator {
    /// Creates a narrator for the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.9,
        }
    }

    /// Points the narrator at a different OpenAI-compatible server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptTurn],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pulls the first non-blank completion out of a raw response body.
fn narration_from_body(body: &[u8]) -> Result<String, NarrationError> {
    let response: ChatResponse = serde_json::from_slice(body)
        .map_err(|e| NarrationError::Parse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(NarrationError::EmptyResponse)
}

impl Narrator for OpenAiNarrator {
    async fn narrate(
        &self,
        prompt: &[PromptTurn],
    ) -> Result<String, NarrationError> {
        if self.api_key.is_empty() {
            return Err(NarrationError::Config("api key is empty".into()));
        }
        let start = Instant::now();

        let request = ChatRequest {
            model: &self.model,
            messages: prompt,
            temperature: self.temperature,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "narration request failed");
                NarrationError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| NarrationError::Network(e.to_string()))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(status = %status, error = %body, "narration API error");
            return Err(NarrationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = narration_from_body(&body)?;
        debug!(
            model = %self.model,
            turns = prompt.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "narration generated"
        );
        Ok(text)
    }
}
