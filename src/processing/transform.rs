use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

use super::{ExtractedFact, FunctionName, PipelineFunction};
use crate::pipeline::data::{from_params, to_params};
use crate::steps::Params;
use crate::types::{Result, SourceDocument, SourceType};

#[derive(Debug, Deserialize)]
struct TransformInput {
    documents: Vec<SourceDocument>,
    extracted_facts: Vec<ExtractedFact>,
}

/// Normalizes fact text, merges duplicates stated by several sources and
/// counts documents per source type.
pub struct TransformFunction;

impl TransformFunction {
    fn normalize_statement(statement: &str) -> String {
        let mut text = statement.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.ends_with(['.', '!', '?']) {
            text.push('.');
        }
        text
    }

    /// Merge facts with the same normalized text. The merged fact keeps the
    /// first occurrence's id and the highest confidence.
    pub fn merge_facts(facts: Vec<ExtractedFact>) -> Vec<ExtractedFact> {
        let mut merged: Vec<ExtractedFact> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();

        for mut fact in facts {
            fact.statement = Self::normalize_statement(&fact.statement);
            if fact.supporting_sources.is_empty() {
                fact.supporting_sources.push(fact.source_id.clone());
            }

            let key = fact.statement.to_lowercase();
            match index.get(&key) {
                Some(&i) => {
                    let existing = &mut merged[i];
                    existing.confidence = existing.confidence.max(fact.confidence);
                    for source in fact.supporting_sources {
                        if !existing.supporting_sources.contains(&source) {
                            existing.supporting_sources.push(source);
                        }
                    }
                }
                None => {
                    index.insert(key, merged.len());
                    merged.push(fact);
                }
            }
        }
        merged
    }
}

#[async_trait]
impl PipelineFunction for TransformFunction {
    fn name(&self) -> FunctionName {
        FunctionName::Transform
    }

    fn description(&self) -> &str {
        "Normalize extracted facts and count sources per type"
    }

    async fn execute(&self, params: Params) -> Result<Params> {
        let input: TransformInput = from_params(&params)?;

        let mut source_type_counts: BTreeMap<SourceType, usize> = BTreeMap::new();
        for doc in &input.documents {
            *source_type_counts.entry(doc.source_type).or_insert(0) += 1;
        }

        to_params(&json!({
            "normalized_facts": Self::merge_facts(input.extracted_facts),
            "source_type_counts": source_type_counts,
        }))
    }
}
