use async_trait::async_trait;
use parking_lot::Mutex;

use crate::llm::client::{GenerationParams, LanguageModelClient, LanguageModelResponse};
use crate::types::Result;

/// Deterministic model: the first rule whose keyword appears in the prompt
/// answers, otherwise the default response does.
///
/// Every prompt is recorded so tests can assert on what was asked.
#[derive(Debug)]
pub struct ScriptedLanguageModel {
    rules: Vec<(String, String)>,
    default_response: String,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLanguageModel {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            default_response: default_response.into(),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every completion returns `status = error` with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut model = Self::new("");
        model.failure = Some(message.into());
        model
    }

    /// Answer prompts containing `keyword` (case-insensitive) with `response`.
    pub fn with_rule(mut self, keyword: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((keyword.into().to_lowercase(), response.into()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl LanguageModelClient for ScriptedLanguageModel {
    async fn complete(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<LanguageModelResponse> {
        self.prompts.lock().push(prompt.to_string());

        if let Some(message) = &self.failure {
            return Ok(LanguageModelResponse::error(message.clone()));
        }

        let lower = prompt.to_lowercase();
        let text = self
            .rules
            .iter()
            .find(|(keyword, _)| lower.contains(keyword.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone());
        Ok(LanguageModelResponse::success(text))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rules_then_default() {
        let model = ScriptedLanguageModel::new("default")
            .with_rule("critique", "Be more specific")
            .with_rule("question", "Q1");
        let params = GenerationParams::default();

        let response = model.complete("Please CRITIQUE this", &params).await.unwrap();
        assert_eq!(response.text, "Be more specific");
        assert_eq!(model.complete("anything", &params).await.unwrap().text, "default");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_reports_error_status() {
        let model = ScriptedLanguageModel::failing("offline");
        let response = model.complete("x", &GenerationParams::default()).await.unwrap();
        assert!(!response.is_success());
        assert_eq!(response.error.as_deref(), Some("offline"));
    }
}
