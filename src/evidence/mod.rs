//! Evidence Scoring
//!
//! Evidence arrives as loose [`EvidenceFragment`]s from different source
//! types. [`EvidenceScorer::assess`] sorts the fragments of one source type
//! into four buckets (direct, indirect, contradictory, neutral) using a
//! heuristic specific to that source type, and
//! [`EvidenceAssessment::overall_score`] turns the buckets into a support
//! score in `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::pipeline::{CollectionData, ProcessingData};
use crate::types::SourceType;

/// Cue words that mark a fragment as disputing its subject.
const CONTRADICTION_CUES: &[&str] = &[
    "disputed",
    "contradict",
    "refuted",
    "debunked",
    "no evidence",
    "controversial",
    "contrary to",
];

/// Relevance at or above which a web entry counts as direct support.
pub const HIGH_RELEVANCE: f32 = 0.7;
/// Relevance at or above which a web entry counts as indirect support.
pub const LOW_RELEVANCE: f32 = 0.4;
/// Indirect support contributed by each secondary encyclopedia reference.
pub const REFERENCE_WEIGHT: f64 = 0.1;

/// A single piece of evidence from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceFragment {
    pub source_id: String,
    pub source_type: SourceType,
    pub text: String,
    pub relevance: f32,
    /// Primary reference article (encyclopedia) or validated fact (analysis).
    #[serde(default)]
    pub is_primary: bool,
    /// Number of outgoing references the fragment carries.
    #[serde(default)]
    pub reference_count: usize,
}

impl EvidenceFragment {
    fn contradicts(&self) -> bool {
        let lower = self.text.to_lowercase();
        CONTRADICTION_CUES.iter().any(|cue| lower.contains(cue))
    }

    fn mentions_any(&self, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }
        let lower = self.text.to_lowercase();
        keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
    }
}

/// All evidence available to a hypothesis test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub fragments: Vec<EvidenceFragment>,
}

impl EvidenceBundle {
    pub fn new(fragments: Vec<EvidenceFragment>) -> Self {
        Self { fragments }
    }

    /// Build the bundle from collected documents and processed facts.
    pub fn from_phases(collection: &CollectionData, processing: &ProcessingData) -> Self {
        let mut fragments: Vec<EvidenceFragment> = collection
            .primary_documents
            .iter()
            .map(|doc| (doc, true))
            .chain(collection.secondary_documents.iter().map(|doc| (doc, false)))
            .map(|(doc, is_primary)| EvidenceFragment {
                source_id: doc.id.clone(),
                source_type: doc.source_type,
                text: format!("{} {}", doc.title, doc.content),
                relevance: doc.relevance_score,
                is_primary: is_primary && doc.source_type == SourceType::Encyclopedia,
                reference_count: doc.references.len(),
            })
            .collect();

        let validated: BTreeSet<&str> = processing
            .validated_facts
            .iter()
            .map(|f| f.statement.as_str())
            .collect();

        fragments.extend(processing.normalized_facts.iter().map(|fact| EvidenceFragment {
            source_id: fact.source_id.clone(),
            source_type: SourceType::Analysis,
            text: fact.statement.clone(),
            relevance: fact.confidence,
            is_primary: validated.contains(fact.statement.as_str()),
            reference_count: 0,
        }));

        Self { fragments }
    }

    /// Source types present, in stable order.
    pub fn source_types(&self) -> Vec<SourceType> {
        self.fragments
            .iter()
            .map(|f| f.source_type)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn of_type(&self, source_type: SourceType) -> Vec<&EvidenceFragment> {
        self.fragments
            .iter()
            .filter(|f| f.source_type == source_type)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Qualitative label for a support score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStrength {
    Strong,
    Moderate,
    Weak,
    Insufficient,
}

impl EvidenceStrength {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            EvidenceStrength::Strong
        } else if score >= 0.5 {
            EvidenceStrength::Moderate
        } else if score >= 0.25 {
            EvidenceStrength::Weak
        } else {
            EvidenceStrength::Insufficient
        }
    }
}

/// Evidence from one source type sorted into support buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAssessment {
    pub source_type: SourceType,
    pub direct_support: f64,
    pub indirect_support: f64,
    pub contradictory_evidence: f64,
    pub neutral_evidence: f64,
}

impl EvidenceAssessment {
    pub fn empty(source_type: SourceType) -> Self {
        Self {
            source_type,
            direct_support: 0.0,
            indirect_support: 0.0,
            contradictory_evidence: 0.0,
            neutral_evidence: 0.0,
        }
    }

    /// Sum of all four buckets.
    pub fn total_mass(&self) -> f64 {
        self.direct_support
            + self.indirect_support
            + self.contradictory_evidence
            + self.neutral_evidence
    }

    /// Supporting share of the evidence mass; `0.0` with no evidence.
    pub fn overall_score(&self) -> f64 {
        let mass = self.total_mass();
        if mass <= 0.0 {
            return 0.0;
        }
        ((self.direct_support + self.indirect_support) / mass).clamp(0.0, 1.0)
    }

    pub fn strength(&self) -> EvidenceStrength {
        EvidenceStrength::from_score(self.overall_score())
    }
}

/// Stateless scorer applying per-source-type heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceScorer;

impl EvidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Assess the bundle's evidence of `source_type` for a claim described
    /// by `keywords`. An empty keyword list matches everything.
    pub fn assess(
        &self,
        source_type: SourceType,
        bundle: &EvidenceBundle,
        keywords: &[String],
    ) -> EvidenceAssessment {
        let fragments = bundle.of_type(source_type);
        if fragments.is_empty() {
            return EvidenceAssessment::empty(source_type);
        }

        match source_type {
            SourceType::Encyclopedia => Self::assess_encyclopedia(&fragments, keywords),
            SourceType::Web => Self::assess_web(&fragments),
            SourceType::Analysis => Self::assess_analysis(&fragments),
        }
    }

    /// Primary article present = direct support; secondary references,
    /// scaled and capped = indirect support.
    fn assess_encyclopedia(
        fragments: &[&EvidenceFragment],
        keywords: &[String],
    ) -> EvidenceAssessment {
        let mut assessment = EvidenceAssessment::empty(SourceType::Encyclopedia);

        let primary: Vec<_> = fragments.iter().filter(|f| f.is_primary).collect();
        assessment.direct_support = if primary.iter().any(|f| f.mentions_any(keywords)) {
            1.0
        } else if !primary.is_empty() {
            0.5
        } else {
            0.0
        };

        let secondary_refs: usize = fragments
            .iter()
            .map(|f| if f.is_primary { f.reference_count } else { f.reference_count + 1 })
            .sum();
        assessment.indirect_support = (secondary_refs as f64 * REFERENCE_WEIGHT).min(1.0);

        let disputed = fragments.iter().filter(|f| f.contradicts()).count();
        assessment.contradictory_evidence = (disputed as f64 * 0.25).min(1.0);

        if assessment.direct_support == 0.0 && assessment.indirect_support == 0.0 {
            assessment.neutral_evidence = 0.2;
        }
        assessment
    }

    /// Each entry lands in exactly one bucket; buckets are fractions of the
    /// entry count.
    fn assess_web(fragments: &[&EvidenceFragment]) -> EvidenceAssessment {
        let mut assessment = EvidenceAssessment::empty(SourceType::Web);
        let total = fragments.len() as f64;

        for fragment in fragments {
            if fragment.contradicts() {
                assessment.contradictory_evidence += 1.0;
            } else if fragment.relevance >= HIGH_RELEVANCE {
                assessment.direct_support += 1.0;
            } else if fragment.relevance >= LOW_RELEVANCE {
                assessment.indirect_support += 1.0;
            } else {
                assessment.neutral_evidence += 1.0;
            }
        }

        assessment.direct_support /= total;
        assessment.indirect_support /= total;
        assessment.contradictory_evidence /= total;
        assessment.neutral_evidence /= total;
        assessment
    }

    /// Validated facts are direct support, unvalidated ones count half as
    /// indirect support with the remainder neutral.
    fn assess_analysis(fragments: &[&EvidenceFragment]) -> EvidenceAssessment {
        let mut assessment = EvidenceAssessment::empty(SourceType::Analysis);
        let total = fragments.len() as f64;
        let validated = fragments.iter().filter(|f| f.is_primary).count() as f64;
        let unvalidated = total - validated;

        assessment.direct_support = validated / total;
        assessment.indirect_support = unvalidated / total * 0.5;
        assessment.neutral_evidence = unvalidated / total * 0.5;
        assessment
    }
}
