use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

use super::{ExtractedFact, FunctionName, PipelineFunction};
use crate::collectors::{Entity, PatternKind, TextPattern};
use crate::pipeline::data::{from_params, to_params};
use crate::steps::Params;
use crate::types::{Result, SourceType};

const MAX_THEMES: usize = 5;

#[derive(Debug, Deserialize)]
struct AnalyzeInput {
    topic: String,
    entities: Vec<Entity>,
    patterns: Vec<TextPattern>,
    normalized_facts: Vec<ExtractedFact>,
    source_type_counts: BTreeMap<SourceType, usize>,
}

/// Derives themes, headline insights and the data flags hypothesis
/// generation reads.
pub struct AnalyzeFunction;

impl AnalyzeFunction {
    /// Largest count wins; ties go to the earlier source type.
    fn dominant(counts: &BTreeMap<SourceType, usize>) -> Option<SourceType> {
        counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .fold(None, |best: Option<(SourceType, usize)>, (kind, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((*kind, *count)),
            })
            .map(|(kind, _)| kind)
    }
}

#[async_trait]
impl PipelineFunction for AnalyzeFunction {
    fn name(&self) -> FunctionName {
        FunctionName::Analyze
    }

    fn description(&self) -> &str {
        "Derive themes, insights and data characteristics"
    }

    async fn execute(&self, params: Params) -> Result<Params> {
        let input: AnalyzeInput = from_params(&params)?;
        let topic_lower = input.topic.to_lowercase();

        let themes: Vec<String> = input
            .entities
            .iter()
            .filter(|e| e.name.to_lowercase() != topic_lower)
            .take(MAX_THEMES)
            .map(|e| e.name.clone())
            .collect();

        let count_of = |kind: PatternKind| input.patterns.iter().filter(|p| p.kind == kind).count();
        let numeric = count_of(PatternKind::Numeric);
        let temporal = count_of(PatternKind::Temporal);
        let causal = count_of(PatternKind::Causal);
        let dominant = Self::dominant(&input.source_type_counts);
        let total_docs: usize = input.source_type_counts.values().sum();

        let mut insights = Vec::new();
        if let Some(kind) = dominant {
            insights.push(format!(
                "{} sources account for {} of {} documents",
                kind,
                input.source_type_counts.get(&kind).copied().unwrap_or(0),
                total_docs
            ));
        }
        if let Some(top) = input.entities.first() {
            insights.push(format!(
                "{} is the most frequently mentioned entity ({} mentions)",
                top.name, top.mentions
            ));
        }
        if numeric > 0 {
            insights.push(format!("Quantitative data appears in {} extracted patterns", numeric));
        }
        if temporal > 0 {
            insights.push(format!(
                "Temporal references suggest {} has evolved over time",
                input.topic
            ));
        }
        if causal > 0 {
            let theme = themes.first().map(String::as_str).unwrap_or("related factors");
            insights.push(format!("Causal language links {} to {}", input.topic, theme));
        }
        if !input.normalized_facts.is_empty() {
            insights.push(format!(
                "{} distinct facts were extracted about {}",
                input.normalized_facts.len(),
                input.topic
            ));
        }

        to_params(&json!({
            "themes": themes,
            "key_insights": insights,
            "dominant_source_type": dominant,
            "has_numeric_data": numeric > 0,
            "has_temporal_data": temporal > 0,
            "has_causal_patterns": causal > 0,
        }))
    }
}
