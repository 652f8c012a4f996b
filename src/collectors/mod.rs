//! External data collaborators
//!
//! The pipeline reads the outside world only through two narrow traits:
//! [`CollectorClient`] returns source documents for a topic and
//! [`TextAnalysisClient`] pulls entities and patterns out of those documents.
//!
//! Implementations:
//! - [`wikipedia::WikipediaCollector`] - MediaWiki action API over reqwest
//! - [`web::WebSearchCollector`] - DuckDuckGo search via daedra
//! - [`analysis::PatternTextAnalyzer`] - regex-based entity and pattern extraction

pub mod analysis;
pub mod web;
pub mod wikipedia;

pub use analysis::PatternTextAnalyzer;
pub use web::WebSearchCollector;
pub use wikipedia::WikipediaCollector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ResearchScope, Result, SourceDocument, SourceType};

/// What a collector is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRequest {
    pub topic: String,
    pub scope: ResearchScope,
    pub max_sources: usize,
    /// Titles to follow instead of searching for the topic.
    #[serde(default)]
    pub seed_references: Vec<String>,
}

impl CollectionRequest {
    pub fn new(topic: impl Into<String>, scope: ResearchScope, max_sources: usize) -> Self {
        Self {
            topic: topic.into(),
            scope,
            max_sources,
            seed_references: Vec::new(),
        }
    }

    pub fn with_seeds(mut self, seeds: Vec<String>) -> Self {
        self.seed_references = seeds;
        self
    }
}

/// Fetches source documents for a topic.
#[async_trait]
pub trait CollectorClient: Send + Sync {
    fn name(&self) -> &str;
    fn source_type(&self) -> SourceType;
    async fn collect(&self, request: &CollectionRequest) -> Result<Vec<SourceDocument>>;
}

/// A named entity and where it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub mentions: usize,
    #[serde(default)]
    pub source_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Numeric,
    Temporal,
    Causal,
    Comparative,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Numeric => "numeric",
            PatternKind::Temporal => "temporal",
            PatternKind::Causal => "causal",
            PatternKind::Comparative => "comparative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPattern {
    pub kind: PatternKind,
    pub value: String,
    pub source_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub entities: Vec<Entity>,
    pub patterns: Vec<TextPattern>,
}

impl TextAnalysis {
    pub fn has_kind(&self, kind: PatternKind) -> bool {
        self.patterns.iter().any(|p| p.kind == kind)
    }
}

/// Extracts entities and patterns from documents.
#[async_trait]
pub trait TextAnalysisClient: Send + Sync {
    async fn analyze(&self, documents: &[SourceDocument]) -> Result<TextAnalysis>;
}
