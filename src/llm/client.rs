use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::types::{PipelineError, Result};

/// Sampling and framing options for one completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            system: None,
        }
    }
}

impl GenerationParams {
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Success,
    Error,
}

/// `{text, status, error?}` as returned by every model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageModelResponse {
    pub text: String,
    pub status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LanguageModelResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: CompletionStatus::Success,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            status: CompletionStatus::Error,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CompletionStatus::Success
    }

    /// The text on success, otherwise an LLM error.
    pub fn into_text(self) -> Result<String> {
        match self.status {
            CompletionStatus::Success => Ok(self.text),
            CompletionStatus::Error => Err(PipelineError::LLM(
                self.error.unwrap_or_else(|| "completion failed".to_string()),
            )),
        }
    }
}

#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<LanguageModelResponse>;

    fn model_name(&self) -> &str;
}

/// Provider selection for runtime construction.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Local Ollama server.
    Ollama { base_url: String, model: String },

    /// OpenAI or any API exposing `/chat/completions`.
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Deterministic responses; `default_response` answers every prompt.
    Scripted { default_response: String },
}

impl Provider {
    pub fn create_client(&self) -> Result<Arc<dyn LanguageModelClient>> {
        match self {
            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Arc::new(super::ollama::OllamaClient::new(
                base_url,
                model.clone(),
            )?)),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { .. } => Err(PipelineError::Configuration(
                "Ollama provider requires the 'ollama' feature".to_string(),
            )),

            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::openai::OpenAICompatibleClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            )?)),

            Provider::Scripted { default_response } => Ok(Arc::new(
                super::scripted::ScriptedLanguageModel::new(default_response.clone()),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama { .. } => "Ollama",
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Scripted { .. } => "Scripted",
        }
    }
}

static LIST_MARKER: OnceLock<Option<Regex>> = OnceLock::new();

/// Strip a list marker (`1.`, `2)`, `-`, `*`, `•` followed by whitespace)
/// from the start of a model output line. Leading numbers that are part of
/// the text, like `2030 targets`, are kept.
pub fn strip_list_marker(line: &str) -> &str {
    let marker = LIST_MARKER.get_or_init(|| Regex::new(r"^(?:\d{1,3}[.)]|[-*•])\s+").ok());
    match marker.as_ref().and_then(|re| re.find(line)) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("1. What drives prices?"), "What drives prices?");
        assert_eq!(strip_list_marker("12) Ask again"), "Ask again");
        assert_eq!(strip_list_marker("• [hyp_1] Be specific"), "[hyp_1] Be specific");
        assert_eq!(strip_list_marker("2030 targets are binding"), "2030 targets are binding");
        assert_eq!(strip_list_marker("2.5 degrees of warming"), "2.5 degrees of warming");
        assert_eq!(strip_list_marker("-5 percent growth"), "-5 percent growth");
    }

    #[test]
    fn test_into_text() {
        assert_eq!(LanguageModelResponse::success("hi").into_text().unwrap(), "hi");
        let err = LanguageModelResponse::error("rate limited").into_text().unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_scripted_provider_builds_client() {
        let client = Provider::Scripted {
            default_response: "ok".to_string(),
        }
        .create_client()
        .unwrap();
        let response = client.complete("anything", &GenerationParams::default()).await.unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(client.model_name(), "scripted");
    }

    #[test]
    fn test_provider_names() {
        let provider = Provider::OpenAI {
            api_key: String::new(),
            api_base: "http://localhost".to_string(),
            model: "m".to_string(),
        };
        assert_eq!(provider.name(), "OpenAI");
    }
}
