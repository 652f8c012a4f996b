use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{ExtractedFact, FunctionName, PipelineFunction};
use crate::collectors::TextAnalysisClient;
use crate::pipeline::data::{from_params, to_params};
use crate::steps::Params;
use crate::types::{Result, SourceDocument};

const MAX_FACTS_PER_DOCUMENT: usize = 5;
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_SENTENCE_CHARS: usize = 400;

#[derive(Debug, Deserialize)]
struct ExtractInput {
    topic: String,
    documents: Vec<SourceDocument>,
}

/// Entities and patterns via the text analyzer; facts are informative
/// sentences (numbers or topic terms) from each document.
pub struct ExtractFunction {
    analyzer: Arc<dyn TextAnalysisClient>,
}

impl ExtractFunction {
    pub fn new(analyzer: Arc<dyn TextAnalysisClient>) -> Self {
        Self { analyzer }
    }

    fn facts_from(
        doc: &SourceDocument,
        doc_index: usize,
        keywords: &[String],
    ) -> Vec<ExtractedFact> {
        doc.content
            .split_terminator(['.', '!', '?', '\n'])
            .map(str::trim)
            .filter(|s| (MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&s.chars().count()))
            .filter_map(|sentence| {
                let lower = sentence.to_lowercase();
                let numeric = sentence.chars().any(|c| c.is_ascii_digit());
                let on_topic = keywords.iter().any(|k| lower.contains(k.as_str()));
                if !numeric && !on_topic {
                    return None;
                }
                let boost = if numeric { 1.0 } else { 0.85 };
                Some((sentence, (doc.relevance_score * boost).clamp(0.0, 1.0)))
            })
            .take(MAX_FACTS_PER_DOCUMENT)
            .enumerate()
            .map(|(i, (sentence, confidence))| ExtractedFact {
                id: format!("fact_{:03}_{:02}", doc_index, i),
                statement: sentence.to_string(),
                source_id: doc.id.clone(),
                source_type: doc.source_type,
                confidence,
                supporting_sources: vec![doc.id.clone()],
                validated: false,
            })
            .collect()
    }
}

#[async_trait]
impl PipelineFunction for ExtractFunction {
    fn name(&self) -> FunctionName {
        FunctionName::Extract
    }

    fn description(&self) -> &str {
        "Extract entities, patterns and candidate facts from documents"
    }

    async fn execute(&self, params: Params) -> Result<Params> {
        let input: ExtractInput = from_params(&params)?;
        let analysis = self.analyzer.analyze(&input.documents).await?;

        let keywords: Vec<String> = input
            .topic
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .map(str::to_lowercase)
            .collect();
        let facts: Vec<ExtractedFact> = input
            .documents
            .iter()
            .enumerate()
            .flat_map(|(i, doc)| Self::facts_from(doc, i, &keywords))
            .collect();

        to_params(&json!({
            "entities": analysis.entities,
            "patterns": analysis.patterns,
            "extracted_facts": facts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::PatternTextAnalyzer;
    use crate::types::SourceType;

    #[tokio::test]
    async fn test_extracts_informative_sentences() {
        let function = ExtractFunction::new(Arc::new(PatternTextAnalyzer::new().unwrap()));
        let doc = SourceDocument::new(
            "wiki_1",
            "Climate policy",
            "Climate policy covers national emissions targets. Cats are nice animals indeed. \
             Emissions fell 12 percent in 2020.",
            SourceType::Encyclopedia,
            0.8,
        );
        let params = to_params(&json!({"topic": "climate policy", "documents": [doc]})).unwrap();

        let out = function.execute(params).await.unwrap();
        let facts: Vec<ExtractedFact> =
            serde_json::from_value(out["extracted_facts"].clone()).unwrap();

        assert_eq!(facts.len(), 2);
        assert!(facts[1].statement.contains("12 percent"));
        assert_eq!(facts[1].confidence, 0.8);
        assert!(out["patterns"].as_array().is_some_and(|p| !p.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_documents_is_an_error() {
        let function = ExtractFunction::new(Arc::new(PatternTextAnalyzer::new().unwrap()));
        let params = to_params(&json!({"topic": "x"})).unwrap();
        assert!(function.execute(params).await.is_err());
    }
}
