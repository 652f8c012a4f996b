use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm::client::{GenerationParams, LanguageModelClient, LanguageModelResponse};
use crate::types::Result;

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
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAICompatibleClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAICompatibleClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl LanguageModelClient for OpenAICompatibleClient {
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<LanguageModelResponse> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = params.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model, %status, "Chat completion rejected");
            return Ok(LanguageModelResponse::error(format!(
                "OpenAI API error ({}): {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        match parsed.choices.into_iter().next().and_then(|c| c.message.content) {
            Some(text) => Ok(LanguageModelResponse::success(text)),
            None => Ok(LanguageModelResponse::error("No response from model")),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
