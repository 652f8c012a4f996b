//! Hypothesis Generation and Testing
//!
//! [`HypothesisEngine`] turns observed data patterns into typed hypothesis
//! statements, tests the claims those statements make against an
//! [`EvidenceBundle`], and derives refined hypotheses from critiques.
//!
//! The engine keeps no state between calls. Refinement never edits a
//! hypothesis; it returns a new record whose [`Refinement`] links back to
//! the original.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::evidence::{EvidenceAssessment, EvidenceBundle, EvidenceScorer, EvidenceStrength};
use crate::pipeline::{CollectionData, ProcessingData};
use crate::types::{PipelineError, Result, SourceType};

/// Phrases that make a statement testable. Each distinct phrase present adds
/// [`TESTABILITY_INCREMENT`].
pub const TESTABILITY_INDICATORS: &[&str] = &[
    "demonstrates",
    "because of",
    "results in",
    "will",
    "measurable",
    "measured",
    "increase",
    "decrease",
    "compared",
    "significant",
    "percent",
    "percentage",
    "correlation",
    "over time",
];

pub const TESTABILITY_INCREMENT: f64 = 0.15;

const SPECIFICITY_QUALIFIER: &str = "Specifically, ";
const MEASURABILITY_QUALIFIER: &str = ", as measured by quantifiable indicators";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HypothesisType {
    Descriptive,
    Comparative,
    Causal,
    Predictive,
    Explanatory,
}

impl HypothesisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HypothesisType::Descriptive => "descriptive",
            HypothesisType::Comparative => "comparative",
            HypothesisType::Causal => "causal",
            HypothesisType::Predictive => "predictive",
            HypothesisType::Explanatory => "explanatory",
        }
    }
}

impl fmt::Display for HypothesisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HypothesisType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "descriptive" => Ok(HypothesisType::Descriptive),
            "comparative" => Ok(HypothesisType::Comparative),
            "causal" => Ok(HypothesisType::Causal),
            "predictive" => Ok(HypothesisType::Predictive),
            "explanatory" => Ok(HypothesisType::Explanatory),
            other => Err(PipelineError::UnknownTag {
                kind: "hypothesis_type",
                tag: other.to_string(),
            }),
        }
    }
}

/// Link from a refined hypothesis back to the one it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    pub original_id: String,
    pub original_statement: String,
    pub refined_statement: String,
    pub critiques_addressed: Vec<String>,
    pub new_evidence_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: String,
    #[serde(rename = "type")]
    pub hypothesis_type: HypothesisType,
    pub topic: String,
    pub statement: String,
    pub testability_score: f64,
    pub generated_at: DateTime<Utc>,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement: Option<Refinement>,
}

/// Patterns the engine reads when filling statement templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchData {
    pub source_count: usize,
    pub source_type_counts: BTreeMap<SourceType, usize>,
    pub dominant_source_type: Option<SourceType>,
    pub has_numeric_data: bool,
    pub has_temporal_data: bool,
    pub has_causal_patterns: bool,
    pub key_entities: Vec<String>,
    pub themes: Vec<String>,
}

impl ResearchData {
    pub fn from_phases(collection: &CollectionData, processing: &ProcessingData) -> Self {
        let mut source_type_counts = processing.source_type_counts.clone();
        if source_type_counts.is_empty() {
            for doc in collection.all_documents() {
                *source_type_counts.entry(doc.source_type).or_insert(0) += 1;
            }
        }

        let dominant_source_type = processing.dominant_source_type.or_else(|| {
            source_type_counts
                .iter()
                .max_by_key(|(_, count)| **count)
                .map(|(source_type, _)| *source_type)
        });

        Self {
            source_count: collection.document_count(),
            source_type_counts,
            dominant_source_type,
            has_numeric_data: processing.has_numeric_data,
            has_temporal_data: processing.has_temporal_data,
            has_causal_patterns: processing.has_causal_patterns,
            key_entities: processing.entities.iter().take(5).map(|e| e.name.clone()).collect(),
            themes: processing.themes.clone(),
        }
    }

    /// Hypothesis types the data can support, descriptive first.
    pub fn suitable_types(&self) -> Vec<HypothesisType> {
        let mut types = vec![HypothesisType::Descriptive];
        if self.source_type_counts.len() >= 2 {
            types.push(HypothesisType::Comparative);
        }
        if self.has_causal_patterns {
            types.push(HypothesisType::Causal);
        }
        if self.has_temporal_data {
            types.push(HypothesisType::Predictive);
        }
        if self.key_entities.len() >= 2 {
            types.push(HypothesisType::Explanatory);
        }
        types
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    ObservablePattern,
    Prediction,
    CausalRelationship,
    Comparison,
    Mechanism,
    General,
}

impl ClaimKind {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimKind::ObservablePattern => "observable pattern claim",
            ClaimKind::Prediction => "prediction claim",
            ClaimKind::CausalRelationship => "causal relationship claim",
            ClaimKind::Comparison => "comparison claim",
            ClaimKind::Mechanism => "mechanism claim",
            ClaimKind::General => "general claim",
        }
    }
}

/// Trigger phrase → claim kind, checked in order.
const CLAIM_TRIGGERS: &[(&str, ClaimKind)] = &[
    ("demonstrates", ClaimKind::ObservablePattern),
    ("will", ClaimKind::Prediction),
    ("because of", ClaimKind::CausalRelationship),
    ("results in", ClaimKind::CausalRelationship),
    ("compared", ClaimKind::Comparison),
    ("differences", ClaimKind::Comparison),
    ("explained by", ClaimKind::Mechanism),
];

/// An atomic claim extracted from a hypothesis statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub kind: ClaimKind,
    pub text: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimEvaluation {
    pub claim: Claim,
    pub assessments: Vec<EvidenceAssessment>,
    pub support_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    StronglySupported,
    ModeratelySupported,
    PartiallySupported,
    NotSupported,
}

impl Conclusion {
    pub fn from_score(score: f64) -> Self {
        if score > 0.75 {
            Conclusion::StronglySupported
        } else if score > 0.5 {
            Conclusion::ModeratelySupported
        } else if score > 0.25 {
            Conclusion::PartiallySupported
        } else {
            Conclusion::NotSupported
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Conclusion::StronglySupported => {
                "Hypothesis strongly supported by evidence and analysis"
            }
            Conclusion::ModeratelySupported => {
                "Hypothesis moderately supported by available evidence"
            }
            Conclusion::PartiallySupported => {
                "Hypothesis partially supported; further investigation needed"
            }
            Conclusion::NotSupported => "Hypothesis not supported by available evidence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisTestResult {
    pub hypothesis_id: String,
    pub statement: String,
    pub claims: Vec<ClaimEvaluation>,
    pub support_score: f64,
    pub evidence_strength: EvidenceStrength,
    pub conclusion: Conclusion,
    pub summary: String,
    pub tested_at: DateTime<Utc>,
}

/// Feedback on a hypothesis. `hypothesis_id = None` applies to all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypothesis_id: Option<String>,
    pub text: String,
}

impl Critique {
    pub fn applies_to(&self, hypothesis: &Hypothesis) -> bool {
        match &self.hypothesis_id {
            Some(id) => id == &hypothesis.id,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HypothesisEngine {
    scorer: EvidenceScorer,
}

impl HypothesisEngine {
    pub fn new(scorer: EvidenceScorer) -> Self {
        Self { scorer }
    }

    /// Fill the template for `hypothesis_type` from `data`.
    pub fn generate(
        &self,
        topic: &str,
        data: &ResearchData,
        hypothesis_type: HypothesisType,
    ) -> Hypothesis {
        let statement = Self::fill_template(topic, data, hypothesis_type);
        let testability_score = Self::testability(&statement);

        tracing::debug!(
            kind = %hypothesis_type,
            testability = testability_score,
            "Generated hypothesis"
        );

        Hypothesis {
            id: format!("hyp_{}", Uuid::new_v4().simple()),
            hypothesis_type,
            topic: topic.to_string(),
            statement,
            testability_score,
            generated_at: Utc::now(),
            version: 1,
            refinement: None,
        }
    }

    /// One hypothesis per type the data supports.
    pub fn generate_all(&self, topic: &str, data: &ResearchData) -> Vec<Hypothesis> {
        data.suitable_types()
            .into_iter()
            .map(|t| self.generate(topic, data, t))
            .collect()
    }

    fn fill_template(topic: &str, data: &ResearchData, hypothesis_type: HypothesisType) -> String {
        let subject = capitalize(topic);
        let dominant = data
            .dominant_source_type
            .map(|s| s.as_str())
            .unwrap_or("available");
        let theme = data.themes.first().map(String::as_str).unwrap_or(topic);
        let first_entity = data.key_entities.first().map(String::as_str).unwrap_or("underlying");
        let second_entity = data.key_entities.get(1).map(String::as_str).unwrap_or("contextual");

        match hypothesis_type {
            HypothesisType::Descriptive => {
                let mut statement = format!(
                    "{} demonstrates consistent patterns across {} {} sources",
                    subject, data.source_count, dominant
                );
                if data.has_numeric_data {
                    statement.push_str(", with measurable quantitative indicators");
                }
                statement
            }
            HypothesisType::Comparative => {
                let mut kinds = data.source_type_counts.keys();
                let a = kinds.next().map(|s| s.as_str()).unwrap_or("primary");
                let b = kinds.next().map(|s| s.as_str()).unwrap_or("secondary");
                format!(
                    "{} shows significant differences between {} and {} sources \
                     when compared on coverage of {}",
                    subject, a, b, theme
                )
            }
            HypothesisType::Causal => format!(
                "Developments in {} occur because of {} factors, \
                 which results in observable changes in {}",
                topic, first_entity, theme
            ),
            HypothesisType::Predictive => format!(
                "{} will continue to change over time, with a measurable increase in {} activity",
                subject, theme
            ),
            HypothesisType::Explanatory => format!(
                "The structure of {} can be explained by the interaction of {} and {}, \
                 which demonstrates an underlying mechanism",
                topic, first_entity, second_entity
            ),
        }
    }

    /// Count distinct indicator phrases, capped at 1.0.
    pub fn testability(statement: &str) -> f64 {
        let normalized = normalize(statement);
        let hits = TESTABILITY_INDICATORS
            .iter()
            .filter(|phrase| normalized.contains(&format!(" {} ", phrase)))
            .count();
        (hits as f64 * TESTABILITY_INCREMENT).min(1.0)
    }

    /// Keyword-triggered claims; a statement with no trigger yields one
    /// general claim.
    pub fn extract_claims(&self, hypothesis: &Hypothesis) -> Vec<Claim> {
        let normalized = normalize(&hypothesis.statement);
        let keywords = topic_keywords(&hypothesis.topic);

        let mut claims: Vec<Claim> = Vec::new();
        for (trigger, kind) in CLAIM_TRIGGERS {
            let seen = claims.iter().any(|c| c.kind == *kind);
            if !seen && normalized.contains(&format!(" {} ", trigger)) {
                claims.push(Claim {
                    kind: *kind,
                    text: format!("{}: {}", kind.label(), hypothesis.statement),
                    keywords: keywords.clone(),
                });
            }
        }

        if claims.is_empty() {
            claims.push(Claim {
                kind: ClaimKind::General,
                text: format!("{}: {}", ClaimKind::General.label(), hypothesis.statement),
                keywords,
            });
        }
        claims
    }

    /// Score each claim against every source type present and bucket the
    /// mean support into a conclusion.
    pub fn test_claims(
        &self,
        hypothesis: &Hypothesis,
        evidence: &EvidenceBundle,
    ) -> HypothesisTestResult {
        let source_types = evidence.source_types();
        let claims: Vec<ClaimEvaluation> = self
            .extract_claims(hypothesis)
            .into_iter()
            .map(|claim| {
                let assessments: Vec<EvidenceAssessment> = source_types
                    .iter()
                    .map(|st| self.scorer.assess(*st, evidence, &claim.keywords))
                    .collect();
                let support_score = mean(assessments.iter().map(|a| a.overall_score()));
                ClaimEvaluation {
                    claim,
                    assessments,
                    support_score,
                }
            })
            .collect();

        let support_score = mean(claims.iter().map(|c| c.support_score)).clamp(0.0, 1.0);
        let conclusion = Conclusion::from_score(support_score);

        tracing::debug!(
            hypothesis = %hypothesis.id,
            support = support_score,
            claims = claims.len(),
            "Hypothesis tested"
        );

        HypothesisTestResult {
            hypothesis_id: hypothesis.id.clone(),
            statement: hypothesis.statement.clone(),
            claims,
            support_score,
            evidence_strength: EvidenceStrength::from_score(support_score),
            conclusion,
            summary: conclusion.description().to_string(),
            tested_at: Utc::now(),
        }
    }

    /// Derive a new hypothesis from critiques and new evidence.
    pub fn refine(
        &self,
        hypothesis: &Hypothesis,
        new_evidence: &[String],
        critiques: &[Critique],
    ) -> Hypothesis {
        let relevant: Vec<&Critique> = critiques
            .iter()
            .filter(|c| c.applies_to(hypothesis))
            .collect();
        let mentions = |word: &str| relevant.iter().any(|c| c.text.to_lowercase().contains(word));

        let mut statement = hypothesis.statement.clone();
        if mentions("specific") && !statement.starts_with(SPECIFICITY_QUALIFIER) {
            statement = format!("{}{}", SPECIFICITY_QUALIFIER, lowercase_first(&statement));
        }
        if mentions("measurable") && !statement.contains(MEASURABILITY_QUALIFIER) {
            statement = format!("{}{}", statement.trim_end_matches('.'), MEASURABILITY_QUALIFIER);
        }

        Hypothesis {
            id: format!("hyp_{}", Uuid::new_v4().simple()),
            hypothesis_type: hypothesis.hypothesis_type,
            topic: hypothesis.topic.clone(),
            testability_score: Self::testability(&statement),
            refinement: Some(Refinement {
                original_id: hypothesis.id.clone(),
                original_statement: hypothesis.statement.clone(),
                refined_statement: statement.clone(),
                critiques_addressed: relevant.iter().map(|c| c.text.clone()).collect(),
                new_evidence_count: new_evidence.len(),
            }),
            statement,
            generated_at: Utc::now(),
            version: hypothesis.version + 1,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Lowercase, punctuation to spaces, padded so phrases match on word edges.
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn topic_keywords(topic: &str) -> Vec<String> {
    topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(str::to_lowercase)
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
