use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};

use crate::llm::client::{GenerationParams, LanguageModelClient, LanguageModelResponse};
use crate::types::Result;

const DEFAULT_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String) -> Result<Self> {
        let (host, port) = split_base_url(base_url);
        Ok(Self {
            client: Ollama::new(host, port),
            model,
        })
    }
}

/// `http://host:port` → (`http://host`, port).
fn split_base_url(base_url: &str) -> (String, u16) {
    let (scheme, rest) = base_url.split_once("://").unwrap_or(("http", base_url));
    let rest = rest.trim_end_matches('/');
    match rest.rsplit_once(':') {
        Some((host, port)) => (
            format!("{}://{}", scheme, host),
            port.parse().unwrap_or(DEFAULT_PORT),
        ),
        None => (format!("{}://{}", scheme, rest), DEFAULT_PORT),
    }
}

#[async_trait]
impl LanguageModelClient for OllamaClient {
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<LanguageModelResponse> {
        let mut messages = Vec::new();
        if let Some(system) = &params.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt.to_string()));

        let request = ChatMessageRequest::new(self.model.clone(), messages);

        // The server answering with an error is a failed completion, not a
        // transport failure.
        match self.client.send_chat_messages(request).await {
            Ok(response) => Ok(LanguageModelResponse::success(response.message.content)),
            Err(e) => {
                tracing::warn!(model = %self.model, error = %e, "Ollama completion failed");
                Ok(LanguageModelResponse::error(format!("Ollama error: {}", e)))
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
