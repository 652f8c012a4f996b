//! Synthesis agent: builds the knowledge base. [`ExecutiveSummarizer`]
//! writes the optional LLM summary for it once the synthesis step is done.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::{unsupported_mode, AgentMode, ResearchAgent};
use crate::llm::{GenerationParams, LanguageModelClient};
use crate::pipeline::data::{from_params, to_params};
use crate::pipeline::{CollaborationData, CollectionData, ProcessingData};
use crate::steps::{DelegateResponse, Params};
use crate::synthesis::{KnowledgeBase, KnowledgeSynthesizer};
use crate::types::{Result, SynthesisMode};

const SUMMARY_ELEMENTS: usize = 8;

#[derive(Debug, Deserialize)]
struct SynthesisParams {
    topic: String,
    synthesis_mode: String,
    collection_data: CollectionData,
    processing_data: ProcessingData,
    #[serde(default)]
    collaboration_data: CollaborationData,
}

pub struct SynthesisAgent {
    synthesizer: KnowledgeSynthesizer,
}

impl SynthesisAgent {
    pub fn new(synthesizer: KnowledgeSynthesizer) -> Self {
        Self { synthesizer }
    }
}

/// LLM executive summary for a finished knowledge base.
///
/// Runs outside the synthesis step with its own time limit. Any failure
/// (error status, transport error, timeout) is logged and yields `None`.
pub struct ExecutiveSummarizer {
    llm: Arc<dyn LanguageModelClient>,
    timeout: Duration,
}

impl ExecutiveSummarizer {
    pub fn new(llm: Arc<dyn LanguageModelClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn summarize(&self, kb: &KnowledgeBase) -> Option<String> {
        let mut elements: Vec<_> = kb.elements.iter().collect();
        elements.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let bullet_list: Vec<String> = elements
            .iter()
            .take(SUMMARY_ELEMENTS)
            .map(|e| format!("- ({}, {:.2}) {}", e.element_type.as_str(), e.confidence, e.content))
            .collect();

        let prompt = format!(
            r#"Research topic: {}
Overall confidence: {:.2}

Key knowledge elements:
{}

Write a 3-4 sentence executive summary of these findings. Mention the main caveats."#,
            kb.topic,
            kb.overall_confidence,
            bullet_list.join("\n")
        );

        let params = GenerationParams::default();
        let completion = self.llm.complete(&prompt, &params);
        match tokio::time::timeout(self.timeout, completion).await {
            Ok(Ok(response)) if response.is_success() && !response.text.trim().is_empty() => {
                Some(response.text.trim().to_string())
            }
            Ok(Ok(response)) => {
                tracing::warn!(error = ?response.error, "Executive summary generation failed");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Executive summary generation failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Executive summary timed out"
                );
                None
            }
        }
    }
}

#[async_trait]
impl ResearchAgent for SynthesisAgent {
    fn name(&self) -> &str {
        "knowledge_synthesizer"
    }

    fn modes(&self) -> &[AgentMode] {
        &[AgentMode::Synthesize]
    }

    async fn activate(&self, mode: AgentMode, params: Params) -> Result<DelegateResponse> {
        if mode != AgentMode::Synthesize {
            return Err(unsupported_mode(self.name(), mode));
        }
        let input: SynthesisParams = from_params(&params)?;
        let synthesis_mode: SynthesisMode = input.synthesis_mode.parse()?;

        let kb = self.synthesizer.synthesize(
            &input.topic,
            synthesis_mode,
            &input.collection_data,
            &input.processing_data,
            &input.collaboration_data,
        )?;

        Ok(DelegateResponse::ok(to_params(&json!({ "knowledge_base": kb }))?))
    }
}
