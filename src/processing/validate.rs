use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ExtractedFact, FunctionName, PipelineFunction};
use crate::pipeline::data::{from_params, to_params};
use crate::steps::Params;
use crate::types::Result;

#[derive(Debug, Deserialize)]
struct ValidateInput {
    normalized_facts: Vec<ExtractedFact>,
}

/// A fact is validated when independent sources agree on it or when its
/// own confidence clears the threshold.
pub struct ValidateFunction {
    min_sources: usize,
    confidence_threshold: f32,
}

impl Default for ValidateFunction {
    fn default() -> Self {
        Self {
            min_sources: 2,
            confidence_threshold: 0.75,
        }
    }
}

impl ValidateFunction {
    pub fn is_validated(&self, fact: &ExtractedFact) -> bool {
        fact.supporting_sources.len() >= self.min_sources
            || fact.confidence >= self.confidence_threshold
    }
}

#[async_trait]
impl PipelineFunction for ValidateFunction {
    fn name(&self) -> FunctionName {
        FunctionName::Validate
    }

    fn description(&self) -> &str {
        "Cross-check facts against independent sources"
    }

    async fn execute(&self, params: Params) -> Result<Params> {
        let input: ValidateInput = from_params(&params)?;
        let total = input.normalized_facts.len();

        let validated: Vec<ExtractedFact> = input
            .normalized_facts
            .iter()
            .filter(|f| self.is_validated(f))
            .cloned()
            .map(|mut f| {
                f.validated = true;
                f
            })
            .collect();

        let (validation_ratio, quality_score) = if total == 0 {
            (0.0, 0.0)
        } else {
            let ratio = validated.len() as f64 / total as f64;
            let confidence_sum: f64 =
                input.normalized_facts.iter().map(|f| f.confidence as f64).sum();
            let mean_confidence = confidence_sum / total as f64;
            (ratio, ((mean_confidence + ratio) / 2.0).clamp(0.0, 1.0))
        };

        tracing::debug!(total, validated = validated.len(), "Fact validation complete");

        to_params(&json!({
            "validated_facts": validated,
            "validation_ratio": validation_ratio,
            "quality_score": quality_score,
        }))
    }
}
