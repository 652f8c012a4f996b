//! Domain expert agent that critiques tested hypotheses.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{unsupported_mode, AgentMode, ResearchAgent};
use crate::hypothesis::{Conclusion, Critique, Hypothesis, HypothesisTestResult};
use crate::llm::{strip_list_marker, GenerationParams, LanguageModelClient};
use crate::pipeline::data::{from_params, to_params};
use crate::steps::{DelegateResponse, Params};
use crate::types::Result;

/// Testability below which the expert always asks for measurable terms.
const LOW_TESTABILITY: f64 = 0.3;

const SYSTEM_PROMPT: &str = "You are a domain expert reviewing research hypotheses. \
Be concise and concrete. Point out when a hypothesis should be more specific or more measurable.";

#[derive(Debug, Deserialize)]
struct CritiqueParams {
    topic: String,
    hypotheses: Vec<Hypothesis>,
    test_results: Vec<HypothesisTestResult>,
}

pub struct DomainExpertAgent {
    llm: Arc<dyn LanguageModelClient>,
    params: GenerationParams,
}

impl DomainExpertAgent {
    pub fn new(llm: Arc<dyn LanguageModelClient>) -> Self {
        Self {
            llm,
            params: GenerationParams {
                temperature: 0.3,
                ..GenerationParams::default()
            }
            .with_system(SYSTEM_PROMPT),
        }
    }

    fn build_prompt(input: &CritiqueParams) -> String {
        let listing: Vec<String> = input
            .hypotheses
            .iter()
            .map(|h| {
                let result = input.test_results.iter().find(|r| r.hypothesis_id == h.id);
                match result {
                    Some(r) => format!(
                        "[{}] {} (support {:.2}: {})",
                        h.id, h.statement, r.support_score, r.summary
                    ),
                    None => format!("[{}] {} (untested)", h.id, h.statement),
                }
            })
            .collect();

        format!(
            r#"Research topic: {}

Hypotheses under review:
{}

Critique each hypothesis on its own line, formatted as:
[hypothesis_id] critique

ONLY output the critique lines and nothing else."#,
            input.topic,
            listing.join("\n")
        )
    }

    /// One critique per non-empty line. A leading `[id]` naming a known
    /// hypothesis targets that hypothesis; anything else applies to all.
    pub fn parse_critiques(text: &str, hypotheses: &[Hypothesis]) -> Vec<Critique> {
        text.lines()
            .map(|line| strip_list_marker(line.trim()).trim())
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                let (id, rest) = match line.strip_prefix('[').and_then(|l| l.split_once(']')) {
                    Some((id, rest)) => (Some(id.trim()), rest.trim()),
                    None => (None, line),
                };
                if rest.is_empty() {
                    return None;
                }
                let hypothesis_id = id
                    .filter(|id| hypotheses.iter().any(|h| h.id == *id))
                    .map(str::to_string);
                Some(Critique {
                    hypothesis_id,
                    text: rest.to_string(),
                })
            })
            .collect()
    }

    /// Checks that do not need the model.
    fn standing_critiques(input: &CritiqueParams) -> Vec<Critique> {
        let mut critiques = Vec::new();
        for hypothesis in &input.hypotheses {
            if hypothesis.testability_score < LOW_TESTABILITY {
                critiques.push(Critique {
                    hypothesis_id: Some(hypothesis.id.clone()),
                    text: "Hard to test as stated; phrase the outcome in measurable terms"
                        .to_string(),
                });
            }
        }
        for result in &input.test_results {
            if result.conclusion == Conclusion::NotSupported {
                critiques.push(Critique {
                    hypothesis_id: Some(result.hypothesis_id.clone()),
                    text: "Not supported by the collected evidence; \
                           narrow it to a more specific claim"
                        .to_string(),
                });
            }
        }
        critiques
    }
}

#[async_trait]
impl ResearchAgent for DomainExpertAgent {
    fn name(&self) -> &str {
        "domain_expert"
    }

    fn modes(&self) -> &[AgentMode] {
        &[AgentMode::Critique]
    }

    async fn activate(&self, mode: AgentMode, params: Params) -> Result<DelegateResponse> {
        if mode != AgentMode::Critique {
            return Err(unsupported_mode(self.name(), mode));
        }
        let input: CritiqueParams = from_params(&params)?;
        if input.hypotheses.is_empty() {
            return Ok(DelegateResponse::ok(to_params(&json!({ "critiques": [] }))?));
        }

        let response = self.llm.complete(&Self::build_prompt(&input), &self.params).await?;
        if !response.is_success() {
            return Ok(DelegateResponse::failure(
                response.error.unwrap_or_else(|| "critique generation failed".to_string()),
            ));
        }

        let mut critiques = Self::parse_critiques(&response.text, &input.hypotheses);
        critiques.extend(Self::standing_critiques(&input));

        tracing::info!(
            model = self.llm.model_name(),
            critiques = critiques.len(),
            "Domain expert critique complete"
        );
        Ok(DelegateResponse::ok(to_params(&json!({ "critiques": critiques }))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::{HypothesisEngine, HypothesisType, ResearchData};
    use crate::llm::ScriptedLanguageModel;

    fn hypothesis() -> Hypothesis {
        HypothesisEngine::default().generate(
            "climate policy",
            &ResearchData::default(),
            HypothesisType::Predictive,
        )
    }

    #[test]
    fn test_parse_targets_known_ids() {
        let h = hypothesis();
        let text = format!(
            "1. [{}] Be more specific\n- [hyp_unknown] General remark\n\n[]\n",
            h.id
        );
        let critiques = DomainExpertAgent::parse_critiques(&text, std::slice::from_ref(&h));

        assert_eq!(critiques.len(), 2);
        assert_eq!(critiques[0].hypothesis_id.as_deref(), Some(h.id.as_str()));
        assert_eq!(critiques[0].text, "Be more specific");
        assert_eq!(critiques[1].hypothesis_id, None);
    }

    #[test]
    fn test_parse_keeps_leading_figures() {
        let text = "2. 2030 targets lack interim milestones\n1990 baselines hide early cuts";
        let critiques = DomainExpertAgent::parse_critiques(text, &[]);

        assert_eq!(critiques.len(), 2);
        assert_eq!(critiques[0].text, "2030 targets lack interim milestones");
        assert_eq!(critiques[1].text, "1990 baselines hide early cuts");
        assert!(critiques.iter().all(|c| c.hypothesis_id.is_none()));
    }

    #[tokio::test]
    async fn test_llm_error_is_failure_response() {
        let agent = DomainExpertAgent::new(Arc::new(ScriptedLanguageModel::failing("offline")));
        let params = to_params(&json!({
            "topic": "climate policy",
            "hypotheses": [hypothesis()],
            "test_results": []
        }))
        .unwrap();

        let response = agent.activate(AgentMode::Critique, params).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("offline"));
    }

    #[tokio::test]
    async fn test_prompt_lists_hypotheses() {
        let model = Arc::new(ScriptedLanguageModel::new("Needs measurable outcomes"));
        let agent = DomainExpertAgent::new(model.clone());
        let h = hypothesis();
        let params = to_params(&json!({
            "topic": "climate policy",
            "hypotheses": [h.clone()],
            "test_results": []
        }))
        .unwrap();

        let response = agent.activate(AgentMode::Critique, params).await.unwrap();
        assert!(response.success);
        assert!(model.prompts()[0].contains(&h.id));
        let critiques: Vec<Critique> =
            serde_json::from_value(response.data["critiques"].clone()).unwrap();
        assert!(critiques.iter().any(|c| c.text == "Needs measurable outcomes"));
    }
}
