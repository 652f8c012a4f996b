use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::collectors::{Entity, TextPattern};
use crate::conversation::Conversation;
use crate::hypothesis::{Critique, Hypothesis, HypothesisTestResult};
use crate::processing::ExtractedFact;
use crate::steps::Params;
use crate::types::{PipelineError, Result, SourceDocument, SourceType};

/// Output of the collection phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionData {
    #[serde(default)]
    pub primary_documents: Vec<SourceDocument>,
    #[serde(default)]
    pub secondary_documents: Vec<SourceDocument>,
    /// References found in the primary documents, used to seed discovery.
    #[serde(default)]
    pub references: Vec<String>,
}

impl CollectionData {
    /// Primary documents first, then secondary.
    pub fn all_documents(&self) -> impl Iterator<Item = &SourceDocument> {
        self.primary_documents.iter().chain(self.secondary_documents.iter())
    }

    pub fn document_count(&self) -> usize {
        self.primary_documents.len() + self.secondary_documents.len()
    }
}

/// Accreted output of the processing chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingData {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub patterns: Vec<TextPattern>,
    #[serde(default)]
    pub extracted_facts: Vec<ExtractedFact>,
    #[serde(default)]
    pub normalized_facts: Vec<ExtractedFact>,
    #[serde(default)]
    pub source_type_counts: BTreeMap<SourceType, usize>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub dominant_source_type: Option<SourceType>,
    #[serde(default)]
    pub has_numeric_data: bool,
    #[serde(default)]
    pub has_temporal_data: bool,
    #[serde(default)]
    pub has_causal_patterns: bool,
    #[serde(default)]
    pub validated_facts: Vec<ExtractedFact>,
    #[serde(default)]
    pub validation_ratio: f64,
    #[serde(default)]
    pub quality_score: f64,
}

/// Output of the agent collaboration phase. Serializes to `{}` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollaborationData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversations: Vec<Conversation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hypotheses: Vec<Hypothesis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_results: Vec<HypothesisTestResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub critiques: Vec<Critique>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refined_hypotheses: Vec<Hypothesis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<String>,
}

impl CollaborationData {
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
            && self.hypotheses.is_empty()
            && self.test_results.is_empty()
            && self.critiques.is_empty()
            && self.refined_hypotheses.is_empty()
            && self.insights.is_empty()
    }
}

/// Serialize a phase payload into a step parameter map.
pub fn to_params<T: Serialize>(value: &T) -> Result<Params> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(PipelineError::InvalidInput(format!(
            "expected an object payload, got {}",
            other
        ))),
    }
}

/// Deserialize a step parameter map into a phase payload.
pub fn from_params<T: for<'de> Deserialize<'de>>(params: &Params) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(params.clone()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_collaboration_serializes_to_empty_object() {
        let json = serde_json::to_value(CollaborationData::default()).unwrap();
        assert_eq!(json, json!({}));
        assert!(CollaborationData::default().is_empty());
    }

    #[test]
    fn test_processing_data_tolerates_partial_maps() {
        let params = json!({"themes": ["energy"], "has_numeric_data": true, "extra": 1});
        let data: ProcessingData = from_params(params.as_object().unwrap()).unwrap();
        assert_eq!(data.themes, vec!["energy"]);
        assert!(data.has_numeric_data);
        assert!(data.entities.is_empty());
    }

    #[test]
    fn test_source_type_counts_use_tag_keys() {
        let mut data = ProcessingData::default();
        data.source_type_counts.insert(SourceType::Web, 2);
        let params = to_params(&data).unwrap();
        assert_eq!(params["source_type_counts"], json!({"web": 2}));
    }
}
