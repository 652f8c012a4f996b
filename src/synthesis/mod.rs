//! Knowledge Synthesis
//!
//! [`KnowledgeSynthesizer`] folds the outputs of the processing and
//! collaboration phases into a [`KnowledgeBase`]: a list of
//! [`KnowledgeElement`]s with an aggregate confidence and prioritized
//! recommendations.
//!
//! Aggregate confidence is a weighted mean of four sub-scores, each already
//! normalized to `[0, 1]`:
//!
//! - average element confidence
//! - source diversity (unique sources / 10, capped)
//! - validation ratio (validated elements / total)
//! - completeness (distinct element types / 5, capped)
//!
//! The weights are tunable through [`ConfidenceWeights`]; the default weights
//! are equal, so the aggregate is the plain mean.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

use crate::pipeline::{CollaborationData, CollectionData, ProcessingData};
use crate::types::{PipelineError, Result, SynthesisMode};

/// Unique sources needed for a full diversity score.
pub const DIVERSITY_TARGET: f64 = 10.0;
/// Confidence at or above which a single-source element counts as validated.
pub const VALIDATION_CONFIDENCE: f64 = 0.75;
/// Confidence assigned to every element of a fallback knowledge base.
pub const DEFAULT_FALLBACK_CONFIDENCE: f64 = 0.6;

const TITLE_CHARS: usize = 80;
const FALLBACK_CONTENT_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Fact,
    Concept,
    Pattern,
    Insight,
    Hypothesis,
}

impl ElementType {
    pub const ALL: [ElementType; 5] = [
        ElementType::Fact,
        ElementType::Concept,
        ElementType::Pattern,
        ElementType::Insight,
        ElementType::Hypothesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Fact => "fact",
            ElementType::Concept => "concept",
            ElementType::Pattern => "pattern",
            ElementType::Insight => "insight",
            ElementType::Hypothesis => "hypothesis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Validated,
    Unvalidated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub title: String,
    pub content: String,
    pub sources: Vec<String>,
    pub confidence: f64,
    pub validation_status: ValidationStatus,
}

impl KnowledgeElement {
    fn new(
        id: String,
        element_type: ElementType,
        content: String,
        sources: Vec<String>,
        confidence: f64,
        validated: bool,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let validated = validated || sources.len() >= 2 || confidence >= VALIDATION_CONFIDENCE;
        Self {
            id,
            element_type,
            title: truncate(&content, TITLE_CHARS),
            content,
            sources,
            confidence,
            validation_status: if validated {
                ValidationStatus::Validated
            } else {
                ValidationStatus::Unvalidated
            },
        }
    }

    pub fn is_validated(&self) -> bool {
        self.validation_status == ValidationStatus::Validated
    }
}

/// Relative weight of each confidence sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    #[serde(default = "default_weight")]
    pub element_confidence: f64,
    #[serde(default = "default_weight")]
    pub source_diversity: f64,
    #[serde(default = "default_weight")]
    pub validation: f64,
    #[serde(default = "default_weight")]
    pub completeness: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            element_confidence: 1.0,
            source_diversity: 1.0,
            validation: 1.0,
            completeness: 1.0,
        }
    }
}

impl ConfidenceWeights {
    pub fn total(&self) -> f64 {
        self.element_confidence + self.source_diversity + self.validation + self.completeness
    }

    pub fn is_valid(&self) -> bool {
        let all = [
            self.element_confidence,
            self.source_diversity,
            self.validation,
            self.completeness,
        ];
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && self.total() > 0.0
    }
}

/// The four normalized sub-scores behind `overall_confidence`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub average_element_confidence: f64,
    pub source_diversity: f64,
    pub validation_ratio: f64,
    pub completeness: f64,
}

impl ConfidenceBreakdown {
    pub fn from_elements(elements: &[KnowledgeElement]) -> Self {
        if elements.is_empty() {
            return Self::default();
        }
        let total = elements.len() as f64;

        let unique_sources: HashSet<&str> = elements
            .iter()
            .flat_map(|e| e.sources.iter().map(String::as_str))
            .collect();
        let element_types: HashSet<ElementType> = elements.iter().map(|e| e.element_type).collect();

        Self {
            average_element_confidence: elements.iter().map(|e| e.confidence).sum::<f64>() / total,
            source_diversity: (unique_sources.len() as f64 / DIVERSITY_TARGET).min(1.0),
            validation_ratio: elements.iter().filter(|e| e.is_validated()).count() as f64 / total,
            completeness: (element_types.len() as f64 / ElementType::ALL.len() as f64).min(1.0),
        }
    }

    pub fn weighted(&self, weights: &ConfidenceWeights) -> f64 {
        let weights = if weights.is_valid() {
            *weights
        } else {
            ConfidenceWeights::default()
        };
        let sum = self.average_element_confidence * weights.element_confidence
            + self.source_diversity * weights.source_diversity
            + self.validation_ratio * weights.validation
            + self.completeness * weights.completeness;
        (sum / weights.total()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub text: String,
}

impl Recommendation {
    fn new(priority: Priority, category: &str, text: impl Into<String>) -> Self {
        Self {
            priority,
            category: category.to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationMethod {
    Synthesis,
    FallbackSynthesis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub topic: String,
    pub synthesis_mode: SynthesisMode,
    pub creation_method: CreationMethod,
    pub elements: Vec<KnowledgeElement>,
    pub element_counts: BTreeMap<ElementType, usize>,
    pub overall_confidence: f64,
    pub confidence_breakdown: ConfidenceBreakdown,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeBase {
    pub fn elements_of(
        &self,
        element_type: ElementType,
    ) -> impl Iterator<Item = &KnowledgeElement> {
        self.elements.iter().filter(move |e| e.element_type == element_type)
    }
}

/// Aggregates phase outputs into a knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeSynthesizer {
    weights: ConfidenceWeights,
    fallback_confidence: f64,
    summary_limit: usize,
}

impl Default for KnowledgeSynthesizer {
    fn default() -> Self {
        Self {
            weights: ConfidenceWeights::default(),
            fallback_confidence: DEFAULT_FALLBACK_CONFIDENCE,
            summary_limit: 10,
        }
    }
}

impl KnowledgeSynthesizer {
    pub fn new(weights: ConfidenceWeights, fallback_confidence: f64, summary_limit: usize) -> Self {
        Self {
            weights,
            fallback_confidence: fallback_confidence.clamp(0.0, 1.0),
            summary_limit: summary_limit.max(1),
        }
    }

    pub fn weights(&self) -> &ConfidenceWeights {
        &self.weights
    }

    pub fn fallback_confidence(&self) -> f64 {
        self.fallback_confidence
    }

    /// Build the knowledge base for `mode`.
    ///
    /// Fails with [`PipelineError::SynthesisFailure`] when the inputs yield no
    /// element for the requested mode.
    pub fn synthesize(
        &self,
        topic: &str,
        mode: SynthesisMode,
        collection: &CollectionData,
        processing: &ProcessingData,
        collaboration: &CollaborationData,
    ) -> Result<KnowledgeBase> {
        let all = Self::build_elements(collection, processing, collaboration);
        let elements = self.select(mode, all);

        if elements.is_empty() {
            return Err(PipelineError::SynthesisFailure(format!(
                "no knowledge elements available for {} synthesis of '{}'",
                mode, topic
            )));
        }

        let breakdown = ConfidenceBreakdown::from_elements(&elements);
        let overall_confidence = breakdown.weighted(&self.weights);
        let recommendations = Self::recommendations(&breakdown, overall_confidence, &elements);

        tracing::info!(
            topic,
            mode = %mode,
            elements = elements.len(),
            confidence = overall_confidence,
            "Knowledge base synthesized"
        );

        Ok(KnowledgeBase {
            id: format!("kb_{}", Uuid::new_v4().simple()),
            topic: topic.to_string(),
            synthesis_mode: mode,
            creation_method: CreationMethod::Synthesis,
            element_counts: count_by_type(&elements),
            elements,
            overall_confidence,
            confidence_breakdown: breakdown,
            recommendations,
            executive_summary: None,
            created_at: Utc::now(),
        })
    }

    /// Reduced-confidence knowledge base built straight from collected
    /// documents.
    pub fn fallback(
        &self,
        topic: &str,
        mode: SynthesisMode,
        collection: &CollectionData,
    ) -> KnowledgeBase {
        let mut elements: Vec<KnowledgeElement> = collection
            .all_documents()
            .enumerate()
            .map(|(i, doc)| {
                let mut element = KnowledgeElement::new(
                    format!("fact_{:03}", i),
                    ElementType::Fact,
                    truncate(&doc.content, FALLBACK_CONTENT_CHARS),
                    vec![doc.id.clone()],
                    self.fallback_confidence,
                    false,
                );
                element.title = truncate(&doc.title, TITLE_CHARS);
                element
            })
            .collect();

        if elements.is_empty() {
            elements.push(KnowledgeElement::new(
                "concept_000".to_string(),
                ElementType::Concept,
                format!("Research topic: {}", topic),
                Vec::new(),
                self.fallback_confidence,
                false,
            ));
        }

        let breakdown = ConfidenceBreakdown::from_elements(&elements);
        let mut recommendations = vec![Recommendation::new(
            Priority::High,
            "synthesis",
            "Re-run synthesis; this knowledge base was built from raw collection data",
        )];
        recommendations.extend(Self::recommendations(
            &breakdown,
            self.fallback_confidence,
            &elements,
        ));
        dedupe_and_sort(&mut recommendations);

        tracing::warn!(topic, elements = elements.len(), "Using fallback knowledge base");

        KnowledgeBase {
            id: format!("kb_{}", Uuid::new_v4().simple()),
            topic: topic.to_string(),
            synthesis_mode: mode,
            creation_method: CreationMethod::FallbackSynthesis,
            element_counts: count_by_type(&elements),
            elements,
            overall_confidence: self.fallback_confidence,
            confidence_breakdown: breakdown,
            recommendations,
            executive_summary: None,
            created_at: Utc::now(),
        }
    }

    fn build_elements(
        collection: &CollectionData,
        processing: &ProcessingData,
        collaboration: &CollaborationData,
    ) -> Vec<KnowledgeElement> {
        let mut elements = Vec::new();

        let validated: BTreeSet<&str> = processing
            .validated_facts
            .iter()
            .map(|f| f.statement.as_str())
            .collect();
        for (i, fact) in processing.normalized_facts.iter().enumerate() {
            let sources = if fact.supporting_sources.is_empty() {
                vec![fact.source_id.clone()]
            } else {
                fact.supporting_sources.clone()
            };
            elements.push(KnowledgeElement::new(
                format!("fact_{:03}", i),
                ElementType::Fact,
                fact.statement.clone(),
                sources,
                fact.confidence as f64,
                validated.contains(fact.statement.as_str()),
            ));
        }

        for (i, entity) in processing.entities.iter().take(10).enumerate() {
            elements.push(KnowledgeElement::new(
                format!("concept_{:03}", i),
                ElementType::Concept,
                format!("{} (mentioned {} times)", entity.name, entity.mentions),
                entity.source_ids.clone(),
                (0.5 + 0.1 * entity.mentions as f64).min(0.95),
                false,
            ));
        }

        let mut by_kind: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for pattern in &processing.patterns {
            by_kind.entry(pattern.kind).or_default().push(pattern);
        }
        for (i, (kind, patterns)) in by_kind.iter().enumerate() {
            let sources: BTreeSet<String> = patterns.iter().map(|p| p.source_id.clone()).collect();
            let examples: Vec<&str> = patterns.iter().take(3).map(|p| p.value.as_str()).collect();
            elements.push(KnowledgeElement::new(
                format!("pattern_{:03}", i),
                ElementType::Pattern,
                format!(
                    "{} {} patterns observed, e.g. {}",
                    patterns.len(),
                    kind.as_str(),
                    examples.join(", ")
                ),
                sources.into_iter().collect(),
                (0.4 + 0.1 * patterns.len() as f64).min(0.9),
                false,
            ));
        }

        let document_ids: Vec<String> = collection
            .all_documents()
            .take(3)
            .map(|d| d.id.clone())
            .collect();
        let insights = processing
            .key_insights
            .iter()
            .map(|text| (text, 0.7))
            .chain(collaboration.insights.iter().map(|text| (text, 0.65)));
        for (i, (text, confidence)) in insights.enumerate() {
            elements.push(KnowledgeElement::new(
                format!("insight_{:03}", i),
                ElementType::Insight,
                text.clone(),
                document_ids.clone(),
                confidence,
                false,
            ));
        }

        for (i, result) in collaboration.test_results.iter().enumerate() {
            let statement = collaboration
                .refined_hypotheses
                .iter()
                .rev()
                .find(|h| {
                    h.refinement
                        .as_ref()
                        .is_some_and(|r| r.original_id == result.hypothesis_id)
                })
                .map(|h| h.statement.as_str())
                .unwrap_or(result.statement.as_str());
            elements.push(KnowledgeElement::new(
                format!("hypothesis_{:03}", i),
                ElementType::Hypothesis,
                format!("{} ({})", statement, result.summary),
                vec![result.hypothesis_id.clone()],
                result.support_score,
                false,
            ));
        }

        elements
    }

    fn select(
        &self,
        mode: SynthesisMode,
        mut elements: Vec<KnowledgeElement>,
    ) -> Vec<KnowledgeElement> {
        match mode {
            SynthesisMode::Comprehensive => elements,
            SynthesisMode::Summary => {
                elements.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
                elements.truncate(self.summary_limit);
                elements
            }
            SynthesisMode::InsightsOnly => elements
                .into_iter()
                .filter(|e| {
                    matches!(e.element_type, ElementType::Insight | ElementType::Hypothesis)
                })
                .collect(),
        }
    }

    /// Threshold rules over the sub-scores, deduplicated by text, highest
    /// priority first.
    pub fn recommendations(
        breakdown: &ConfidenceBreakdown,
        overall_confidence: f64,
        elements: &[KnowledgeElement],
    ) -> Vec<Recommendation> {
        let mut out = Vec::new();

        if breakdown.validation_ratio < 0.5 {
            out.push(Recommendation::new(
                Priority::High,
                "validation",
                "Add expert validation for unverified knowledge elements",
            ));
        }
        if breakdown.source_diversity < 0.3 {
            out.push(Recommendation::new(
                Priority::High,
                "sources",
                "Broaden the source base with additional independent sources",
            ));
        }
        if breakdown.completeness < 0.6 {
            let present: HashSet<ElementType> = elements.iter().map(|e| e.element_type).collect();
            let missing: Vec<&str> = ElementType::ALL
                .iter()
                .filter(|t| !present.contains(*t))
                .map(|t| t.as_str())
                .collect();
            out.push(Recommendation::new(
                Priority::Medium,
                "coverage",
                format!("Extend analysis to cover missing knowledge types: {}", missing.join(", ")),
            ));
        }
        if breakdown.average_element_confidence < 0.6 {
            out.push(Recommendation::new(
                Priority::Medium,
                "confidence",
                "Gather corroborating evidence for low-confidence elements",
            ));
        }
        if elements.iter().any(|e| e.confidence < 0.4) {
            out.push(Recommendation::new(
                Priority::Low,
                "confidence",
                "Review low-confidence elements before relying on them",
            ));
        }
        if elements
            .iter()
            .any(|e| e.element_type == ElementType::Hypothesis && e.confidence > 0.75)
        {
            out.push(Recommendation::new(
                Priority::Low,
                "research",
                "Design follow-up studies for strongly supported hypotheses",
            ));
        }
        if out.is_empty() && overall_confidence >= 0.8 {
            out.push(Recommendation::new(
                Priority::Low,
                "publication",
                "Knowledge base is ready for expert review and publication",
            ));
        }

        dedupe_and_sort(&mut out);
        out
    }
}

fn dedupe_and_sort(recommendations: &mut Vec<Recommendation>) {
    let mut seen = HashSet::new();
    recommendations.retain(|r| seen.insert(r.text.clone()));
    recommendations.sort_by_key(|r| r.priority);
}

fn count_by_type(elements: &[KnowledgeElement]) -> BTreeMap<ElementType, usize> {
    let mut counts = BTreeMap::new();
    for element in elements {
        *counts.entry(element.element_type).or_insert(0) += 1;
    }
    counts
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{Entity, PatternKind, TextPattern};
    use crate::processing::ExtractedFact;
    use crate::types::{SourceDocument, SourceType};

    fn synthesize(synthesizer: &KnowledgeSynthesizer, mode: SynthesisMode) -> KnowledgeBase {
        synthesizer
            .synthesize(
                "climate policy",
                mode,
                &collection(),
                &processing(),
                &CollaborationData::default(),
            )
            .unwrap()
    }

    fn collection() -> CollectionData {
        CollectionData {
            primary_documents: vec![SourceDocument::new(
                "wiki_1",
                "Climate policy",
                "Climate policy covers emissions targets.",
                SourceType::Encyclopedia,
                0.8,
            )],
            secondary_documents: vec![SourceDocument::new(
                "wiki_2",
                "Carbon tax",
                "A carbon tax prices emissions.",
                SourceType::Encyclopedia,
                0.8,
            )],
            references: vec!["Carbon tax".to_string()],
        }
    }

    fn processing() -> ProcessingData {
        let fact = ExtractedFact {
            id: "fact_1".to_string(),
            statement: "Emissions fell 12 percent in 2020".to_string(),
            source_id: "wiki_1".to_string(),
            source_type: SourceType::Encyclopedia,
            confidence: 0.8,
            supporting_sources: vec!["wiki_1".to_string(), "wiki_2".to_string()],
            validated: true,
        };
        ProcessingData {
            entities: vec![Entity {
                name: "Paris Agreement".to_string(),
                mentions: 3,
                source_ids: vec!["wiki_1".to_string()],
            }],
            patterns: vec![TextPattern {
                kind: PatternKind::Numeric,
                value: "12 percent".to_string(),
                source_id: "wiki_1".to_string(),
            }],
            normalized_facts: vec![fact.clone()],
            validated_facts: vec![fact],
            key_insights: vec!["Carbon pricing dominates the policy debate".to_string()],
            ..ProcessingData::default()
        }
    }

    #[test]
    fn test_synthesize_is_idempotent() {
        let synthesizer = KnowledgeSynthesizer::default();
        let a = synthesize(&synthesizer, SynthesisMode::Comprehensive);
        let b = synthesize(&synthesizer, SynthesisMode::Comprehensive);
        assert_eq!(a.overall_confidence, b.overall_confidence);
        assert_eq!(a.elements, b.elements);
        assert_eq!(a.creation_method, CreationMethod::Synthesis);
    }

    #[test]
    fn test_overall_confidence_is_mean_of_subscores() {
        let kb = synthesize(&KnowledgeSynthesizer::default(), SynthesisMode::Comprehensive);
        let b = kb.confidence_breakdown;
        let sum = b.average_element_confidence + b.source_diversity;
        let expected = (sum + b.validation_ratio + b.completeness) / 4.0;
        assert!((kb.overall_confidence - expected).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&kb.overall_confidence));
        // fact, concept, pattern, insight
        assert!((b.completeness - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_weights_are_tunable() {
        let weights = ConfidenceWeights {
            element_confidence: 1.0,
            source_diversity: 0.0,
            validation: 0.0,
            completeness: 0.0,
        };
        let synthesizer = KnowledgeSynthesizer::new(weights, 0.6, 10);
        let kb = synthesize(&synthesizer, SynthesisMode::Comprehensive);
        let mean = kb.confidence_breakdown.average_element_confidence;
        assert!((kb.overall_confidence - mean).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weights_fall_back_to_equal() {
        let breakdown = ConfidenceBreakdown {
            average_element_confidence: 1.0,
            source_diversity: 0.0,
            validation_ratio: 1.0,
            completeness: 0.0,
        };
        let zero = ConfidenceWeights {
            element_confidence: 0.0,
            source_diversity: 0.0,
            validation: 0.0,
            completeness: 0.0,
        };
        assert_eq!(breakdown.weighted(&zero), 0.5);
    }

    #[test]
    fn test_insights_only_mode() {
        let kb = synthesize(&KnowledgeSynthesizer::default(), SynthesisMode::InsightsOnly);
        assert!(kb
            .elements
            .iter()
            .all(|e| matches!(e.element_type, ElementType::Insight | ElementType::Hypothesis)));
    }

    #[test]
    fn test_empty_mode_selection_fails() {
        let mut data = processing();
        data.key_insights.clear();
        let err = KnowledgeSynthesizer::default()
            .synthesize(
                "climate policy",
                SynthesisMode::InsightsOnly,
                &collection(),
                &data,
                &CollaborationData::default(),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::SynthesisFailure(_)));
    }

    #[test]
    fn test_summary_keeps_top_elements() {
        let synthesizer = KnowledgeSynthesizer::new(ConfidenceWeights::default(), 0.6, 2);
        let kb = synthesize(&synthesizer, SynthesisMode::Summary);
        assert_eq!(kb.elements.len(), 2);
        assert!(kb.elements[0].confidence >= kb.elements[1].confidence);
    }

    #[test]
    fn test_fallback_uses_fixed_confidence() {
        let kb = KnowledgeSynthesizer::default().fallback(
            "climate policy",
            SynthesisMode::Comprehensive,
            &collection(),
        );
        assert_eq!(kb.creation_method, CreationMethod::FallbackSynthesis);
        assert_eq!(kb.overall_confidence, 0.6);
        assert_eq!(kb.elements.len(), 2);
        assert!(kb.elements.iter().all(|e| e.confidence == 0.6));
        assert_eq!(kb.recommendations[0].priority, Priority::High);

        let json = serde_json::to_value(&kb).unwrap();
        assert_eq!(json["creation_method"], "fallback_synthesis");
    }

    #[test]
    fn test_fallback_without_documents_is_not_empty() {
        let kb = KnowledgeSynthesizer::default().fallback(
            "x",
            SynthesisMode::Summary,
            &CollectionData::default(),
        );
        assert_eq!(kb.elements.len(), 1);
    }

    #[test]
    fn test_recommendations_deduplicated_and_ordered() {
        let breakdown = ConfidenceBreakdown {
            average_element_confidence: 0.3,
            source_diversity: 0.1,
            validation_ratio: 0.2,
            completeness: 0.2,
        };
        let elements = vec![KnowledgeElement::new(
            "fact_000".to_string(),
            ElementType::Fact,
            "x".to_string(),
            vec![],
            0.3,
            false,
        )];
        let recs = KnowledgeSynthesizer::recommendations(&breakdown, 0.2, &elements);
        let texts: HashSet<_> = recs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts.len(), recs.len());
        assert!(recs.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert_eq!(recs[0].priority, Priority::High);
    }

    #[test]
    fn test_element_validation_rule() {
        let fact = |id: &str, sources: &[&str], confidence: f64| {
            let sources = sources.iter().map(|s| s.to_string()).collect();
            let content = "x".to_string();
            KnowledgeElement::new(id.into(), ElementType::Fact, content, sources, confidence, false)
        };
        let multi = fact("a", &["s1", "s2"], 0.1);
        let confident = fact("b", &["s1"], 0.9);
        let weak = fact("c", &["s1"], 0.5);
        assert!(multi.is_validated());
        assert!(confident.is_validated());
        assert!(!weak.is_validated());
    }
}
