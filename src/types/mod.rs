use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============= Request Types =============

/// How wide the collection phase casts its net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResearchScope {
    #[default]
    Narrow,
    Broad,
    Comprehensive,
}

impl ResearchScope {
    /// Number of linked references followed during secondary discovery.
    pub fn reference_fanout(&self) -> usize {
        match self {
            ResearchScope::Narrow => 3,
            ResearchScope::Broad => 6,
            ResearchScope::Comprehensive => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchScope::Narrow => "narrow",
            ResearchScope::Broad => "broad",
            ResearchScope::Comprehensive => "comprehensive",
        }
    }
}

impl FromStr for ResearchScope {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "narrow" => Ok(ResearchScope::Narrow),
            "broad" => Ok(ResearchScope::Broad),
            "comprehensive" => Ok(ResearchScope::Comprehensive),
            other => Err(PipelineError::UnknownTag {
                kind: "research_scope",
                tag: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the knowledge base produced by the synthesis phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    #[default]
    Comprehensive,
    Summary,
    InsightsOnly,
}

impl SynthesisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisMode::Comprehensive => "comprehensive",
            SynthesisMode::Summary => "summary",
            SynthesisMode::InsightsOnly => "insights_only",
        }
    }
}

impl FromStr for SynthesisMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "comprehensive" => Ok(SynthesisMode::Comprehensive),
            "summary" => Ok(SynthesisMode::Summary),
            "insights_only" => Ok(SynthesisMode::InsightsOnly),
            other => Err(PipelineError::UnknownTag {
                kind: "synthesis_mode",
                tag: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SynthesisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Source Types =============

/// Kind of source a document or evidence fragment came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Encyclopedia articles (Wikipedia).
    Encyclopedia,
    /// General web search results.
    Web,
    /// Facts derived by the processing phase.
    Analysis,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Encyclopedia => "encyclopedia",
            SourceType::Web => "web",
            SourceType::Analysis => "analysis",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document returned by a collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub content: String,
    pub source_type: SourceType,
    pub relevance_score: f32,
    /// Titles of documents this one links to.
    #[serde(default)]
    pub references: Vec<String>,
    pub retrieved_at: DateTime<Utc>,
}

impl SourceDocument {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        source_type: SourceType,
        relevance_score: f32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            content: content.into(),
            source_type,
            relevance_score: relevance_score.clamp(0.0, 1.0),
            references: Vec::new(),
            retrieved_at: Utc::now(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Schema validation failed for step '{step}': {message}")]
    SchemaValidation { step: String, message: String },

    #[error("Collaborator '{collaborator}' failed: {message}")]
    Collaborator {
        collaborator: String,
        message: String,
    },

    #[error("{phase} phase failed: {source}")]
    PhaseFailure {
        phase: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Step '{step}' timed out after {timeout_secs}s")]
    Timeout { step: String, timeout_secs: u64 },

    #[error("Unknown {kind} '{tag}'")]
    UnknownTag { kind: &'static str, tag: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn collaborator(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Collaborator {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    /// Wrap an error with the phase it happened in.
    pub fn in_phase(self, phase: impl fmt::Display) -> Self {
        PipelineError::PhaseFailure {
            phase: phase.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
