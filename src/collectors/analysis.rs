//! Regex-based text analysis.

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;

use super::{Entity, PatternKind, TextAnalysis, TextAnalysisClient, TextPattern};
use crate::types::{PipelineError, Result, SourceDocument};

const MAX_ENTITIES: usize = 25;

/// Capitalized words that start sentences far more often than they name things.
const STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "It", "In", "On", "At", "As", "An", "A", "For",
    "By", "From", "With", "However", "Its", "There", "Their", "When", "While", "Since", "After",
    "Before", "Some", "Many", "Most", "Other", "Such", "Both", "Each",
];

/// Finds capitalized phrases as entities plus numeric, temporal, causal and
/// comparative patterns.
#[derive(Debug, Clone)]
pub struct PatternTextAnalyzer {
    entity: Regex,
    patterns: Vec<(PatternKind, Regex)>,
}

impl PatternTextAnalyzer {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| {
                    PipelineError::Configuration(format!("Invalid analysis pattern: {}", e))
                })
        };

        Ok(Self {
            entity: compile(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b")?,
            patterns: vec![
                (
                    PatternKind::Numeric,
                    compile(concat!(
                        r"(?i)\b\d+(?:[.,]\d+)?\s*",
                        r"(?:%|percent|million|billion|thousand|tonnes|km|kg|degrees)",
                    ))?,
                ),
                (
                    PatternKind::Temporal,
                    compile(concat!(
                        r"(?i)\b(?:1[5-9]\d{2}|20\d{2})s?\b",
                        r"|\b(?:since|until|by|during)\s+\d{4}\b|\bcentury\b",
                    ))?,
                ),
                (
                    PatternKind::Causal,
                    compile(concat!(
                        r"(?i)\b(?:because of|caused by|leads? to|led to|results? in",
                        r"|resulted in|due to|as a result of)\b",
                    ))?,
                ),
                (
                    PatternKind::Comparative,
                    compile(concat!(
                        r"(?i)\b(?:more than|less than|compared (?:to|with)|higher than",
                        r"|lower than|whereas|in contrast)\b",
                    ))?,
                ),
            ],
        })
    }

    fn entities(&self, documents: &[SourceDocument]) -> Vec<Entity> {
        let mut found: BTreeMap<String, Entity> = BTreeMap::new();
        for doc in documents {
            let text = format!("{}. {}", doc.title, doc.content);
            for m in self.entity.find_iter(&text) {
                let words: Vec<&str> = m
                    .as_str()
                    .split_whitespace()
                    .skip_while(|w| STOPWORDS.contains(w))
                    .collect();
                let name = words.join(" ");
                if name.len() < 3 {
                    continue;
                }
                let name = name.as_str();
                let entry = found.entry(name.to_string()).or_insert_with(|| Entity {
                    name: name.to_string(),
                    mentions: 0,
                    source_ids: Vec::new(),
                });
                entry.mentions += 1;
                if !entry.source_ids.contains(&doc.id) {
                    entry.source_ids.push(doc.id.clone());
                }
            }
        }

        let mut entities: Vec<Entity> = found.into_values().collect();
        // Most mentioned first; name order breaks ties.
        entities.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.name.cmp(&b.name)));
        entities.truncate(MAX_ENTITIES);
        entities
    }
}

#[async_trait]
impl TextAnalysisClient for PatternTextAnalyzer {
    async fn analyze(&self, documents: &[SourceDocument]) -> Result<TextAnalysis> {
        let mut patterns = Vec::new();
        for doc in documents {
            for (kind, regex) in &self.patterns {
                for m in regex.find_iter(&doc.content) {
                    patterns.push(TextPattern {
                        kind: *kind,
                        value: m.as_str().trim().to_string(),
                        source_id: doc.id.clone(),
                    });
                }
            }
        }

        let analysis = TextAnalysis {
            entities: self.entities(documents),
            patterns,
        };
        tracing::debug!(
            documents = documents.len(),
            entities = analysis.entities.len(),
            patterns = analysis.patterns.len(),
            "Text analysis complete"
        );
        Ok(analysis)
    }
}
