//! Agent collaboration phase.
//!
//! The exchange runs in a fixed order: expert questions, expert answers,
//! hypotheses, hypothesis tests, critique, refinement, insight broadcast.
//! Questions and answers are generated concurrently but recorded in the
//! conversation log in question order.

use futures::future::join_all;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

use super::data::{from_params, to_params};
use super::{CollaborationData, CollectionData, ProcessingData};
use crate::conversation::{ConversationCoordinator, MessageType};
use crate::evidence::EvidenceBundle;
use crate::hypothesis::{Conclusion, Critique, HypothesisEngine, ResearchData};
use crate::llm::{strip_list_marker, GenerationParams, LanguageModelClient, LanguageModelResponse};
use crate::steps::{Step, StepContext};
use crate::types::{PipelineError, Result};

pub const RESEARCHER: &str = "researcher";
pub const DOMAIN_EXPERT: &str = "domain_expert";
pub const HYPOTHESIS_GENERATOR: &str = "hypothesis_generator";
pub const CRITIC: &str = "critic";

#[derive(Debug, Deserialize)]
struct CritiqueOutput {
    critiques: Vec<Critique>,
}

/// Everything one collaboration run reads. Nothing here outlives the run.
pub struct Collaboration<'a> {
    pub topic: &'a str,
    pub collection: &'a CollectionData,
    pub processing: &'a ProcessingData,
    pub coordinator: &'a ConversationCoordinator,
    pub llm: &'a dyn LanguageModelClient,
    pub engine: &'a HypothesisEngine,
    pub critique_step: &'a Step,
    pub step_ctx: &'a StepContext<'a>,
    pub expert_questions: usize,
}

impl Collaboration<'_> {
    pub async fn run(&self) -> Result<CollaborationData> {
        let questions = self.ask_expert_questions().await?;
        self.answer_questions(&questions).await?;

        let research_data = ResearchData::from_phases(self.collection, self.processing);
        let hypotheses = self.engine.generate_all(self.topic, &research_data);
        for h in &hypotheses {
            self.coordinator.create_conversation(
                HYPOTHESIS_GENERATOR,
                CRITIC,
                MessageType::Hypothesis,
                &h.statement,
                json!({
                    "hypothesis_id": h.id,
                    "type": h.hypothesis_type,
                    "testability_score": h.testability_score,
                }),
            );
        }

        let evidence = EvidenceBundle::from_phases(self.collection, self.processing);
        let test_results: Vec<_> = hypotheses
            .iter()
            .map(|h| self.engine.test_claims(h, &evidence))
            .collect();
        for result in &test_results {
            self.coordinator.create_conversation(
                HYPOTHESIS_GENERATOR,
                RESEARCHER,
                MessageType::HypothesisTest,
                &format!("{} (support {:.2})", result.summary, result.support_score),
                json!({
                    "hypothesis_id": result.hypothesis_id,
                    "support_score": result.support_score,
                    "conclusion": result.conclusion,
                }),
            );
        }

        let params = to_params(&json!({
            "topic": self.topic,
            "hypotheses": hypotheses,
            "test_results": test_results,
        }))?;
        let output = self.critique_step.run(params, self.step_ctx).await?;
        let critiques = from_params::<CritiqueOutput>(&output)?.critiques;
        for critique in &critiques {
            self.coordinator.create_conversation(
                DOMAIN_EXPERT,
                HYPOTHESIS_GENERATOR,
                MessageType::Critique,
                &critique.text,
                json!({ "hypothesis_id": critique.hypothesis_id }),
            );
        }

        let new_evidence: Vec<String> = self
            .processing
            .validated_facts
            .iter()
            .map(|f| f.statement.clone())
            .collect();
        let refined_hypotheses: Vec<_> = hypotheses
            .iter()
            .filter(|h| critiques.iter().any(|c| c.applies_to(h)))
            .map(|h| self.engine.refine(h, &new_evidence, &critiques))
            .collect();
        for refined in &refined_hypotheses {
            self.coordinator.create_conversation(
                HYPOTHESIS_GENERATOR,
                CRITIC,
                MessageType::Hypothesis,
                &refined.statement,
                json!({
                    "hypothesis_id": refined.id,
                    "refines": refined.refinement.as_ref().map(|r| r.original_id.clone()),
                    "version": refined.version,
                }),
            );
        }

        let insights = self.insights(&test_results);
        for insight in &insights {
            self.coordinator.broadcast(
                RESEARCHER,
                MessageType::Insight,
                insight,
                json!({ "topic": self.topic }),
                &[DOMAIN_EXPERT, HYPOTHESIS_GENERATOR, CRITIC],
            );
        }

        tracing::info!(
            conversations = self.coordinator.len(),
            hypotheses = hypotheses.len(),
            critiques = critiques.len(),
            "Agent collaboration complete"
        );

        Ok(CollaborationData {
            conversations: self.coordinator.history(),
            hypotheses,
            test_results,
            critiques,
            refined_hypotheses,
            insights,
        })
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<LanguageModelResponse> {
        let limit: Duration = self.step_ctx.timeout;
        timeout(limit, self.llm.complete(prompt, params))
            .await
            .map_err(|_| PipelineError::Timeout {
                step: "expert_exchange".to_string(),
                timeout_secs: limit.as_secs(),
            })?
    }

    /// Generate questions concurrently, then record them in index order.
    async fn ask_expert_questions(&self) -> Result<Vec<(String, String)>> {
        let params = GenerationParams::default();
        let prompts: Vec<(String, String)> = (0..self.expert_questions)
            .map(|i| {
                let focus = self
                    .processing
                    .themes
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| self.topic.to_string());
                let prompt = format!(
                    "You are researching {}. Ask a domain expert one precise question about {}. \
                     Output only the question.",
                    self.topic, focus
                );
                (focus, prompt)
            })
            .collect();

        let responses =
            join_all(prompts.iter().map(|(_, prompt)| self.complete(prompt, &params))).await;

        let mut questions = Vec::new();
        for (index, ((focus, _), response)) in prompts.into_iter().zip(responses).enumerate() {
            let response = response?;
            let Some(question) = first_line(&response) else {
                tracing::warn!(index, error = ?response.error, "Expert question generation failed");
                continue;
            };
            let conversation = self.coordinator.create_conversation(
                RESEARCHER,
                DOMAIN_EXPERT,
                MessageType::Question,
                &question,
                json!({ "index": index, "focus": focus }),
            );
            questions.push((conversation.conversation_id, question));
        }
        Ok(questions)
    }

    async fn answer_questions(&self, questions: &[(String, String)]) -> Result<()> {
        let params = GenerationParams::default().with_system(format!(
            "You are a domain expert on {}. Answer in at most three sentences.",
            self.topic
        ));
        let responses = join_all(questions.iter().map(|(_, q)| self.complete(q, &params))).await;

        for ((question_id, _), response) in questions.iter().zip(responses) {
            let response = response?;
            if !response.is_success() || response.text.trim().is_empty() {
                tracing::warn!(
                    question = %question_id,
                    error = ?response.error,
                    "Expert answer missing"
                );
                continue;
            }
            self.coordinator.create_conversation(
                DOMAIN_EXPERT,
                RESEARCHER,
                MessageType::Analysis,
                response.text.trim(),
                json!({ "question_id": question_id }),
            );
        }
        Ok(())
    }

    fn insights(&self, results: &[crate::hypothesis::HypothesisTestResult]) -> Vec<String> {
        let mut insights: Vec<String> = results
            .iter()
            .filter(|r| {
                matches!(
                    r.conclusion,
                    Conclusion::StronglySupported | Conclusion::ModeratelySupported
                )
            })
            .map(|r| format!("Evidence supports: {} (support {:.2})", r.statement, r.support_score))
            .collect();
        if insights.is_empty() {
            insights.push(format!(
                "No hypothesis about {} reached moderate support; more evidence is needed",
                self.topic
            ));
        }
        insights
    }
}

/// First non-empty line of a successful response, list marker stripped.
fn first_line(response: &LanguageModelResponse) -> Option<String> {
    if !response.is_success() {
        return None;
    }
    response
        .text
        .lines()
        .map(|line| strip_list_marker(line.trim()).trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
