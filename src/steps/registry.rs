use super::{FieldType, Schema, Step};
use crate::agents::AgentMode;
use crate::processing::FunctionName;
use crate::types::{PipelineError, Result};

pub const PRIMARY_SOURCE_LOOKUP: &str = "primary_source_lookup";
pub const SECONDARY_SOURCE_DISCOVERY: &str = "secondary_source_discovery";
pub const EXTRACT: &str = "extract";
pub const TRANSFORM: &str = "transform";
pub const ANALYZE: &str = "analyze";
pub const VALIDATE: &str = "validate";
pub const DOMAIN_EXPERT_CRITIQUE: &str = "domain_expert_critique";
pub const KNOWLEDGE_SYNTHESIS: &str = "knowledge_synthesis";

/// Processing steps in execution order.
pub const PROCESSING_CHAIN: [&str; 4] = [EXTRACT, TRANSFORM, ANALYZE, VALIDATE];

/// Ordered collection of immutable steps, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every step the orchestrator runs.
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register(Step::agent(
            PRIMARY_SOURCE_LOOKUP,
            "Look up the primary reference article for the research topic",
            AgentMode::PrimaryLookup,
            Schema::new()
                .required("topic", FieldType::String)
                .required("scope", FieldType::String)
                .required("max_sources", FieldType::Integer),
            Schema::new()
                .required("documents", FieldType::Array)
                .required("references", FieldType::Array),
        ));

        registry.register(Step::agent(
            SECONDARY_SOURCE_DISCOVERY,
            "Discover secondary sources seeded by primary-source references",
            AgentMode::SecondaryDiscovery,
            Schema::new()
                .required("topic", FieldType::String)
                .required("scope", FieldType::String)
                .required("max_sources", FieldType::Integer)
                .required("references", FieldType::Array),
            Schema::new().required("documents", FieldType::Array),
        ));

        registry.register(Step::function(
            EXTRACT,
            "Extract entities, patterns and candidate facts from documents",
            FunctionName::Extract,
            Schema::new()
                .required("topic", FieldType::String)
                .required("documents", FieldType::Array),
            Schema::new()
                .required("entities", FieldType::Array)
                .required("patterns", FieldType::Array)
                .required("extracted_facts", FieldType::Array),
        ));

        registry.register(Step::function(
            TRANSFORM,
            "Normalize extracted facts and count sources per type",
            FunctionName::Transform,
            Schema::new()
                .required("documents", FieldType::Array)
                .required("extracted_facts", FieldType::Array),
            Schema::new()
                .required("normalized_facts", FieldType::Array)
                .required("source_type_counts", FieldType::Object),
        ));

        registry.register(Step::function(
            ANALYZE,
            "Derive themes, insights and data characteristics",
            FunctionName::Analyze,
            Schema::new()
                .required("topic", FieldType::String)
                .required("entities", FieldType::Array)
                .required("patterns", FieldType::Array)
                .required("normalized_facts", FieldType::Array)
                .required("source_type_counts", FieldType::Object),
            Schema::new()
                .required("themes", FieldType::Array)
                .required("key_insights", FieldType::Array)
                .optional("dominant_source_type", FieldType::String)
                .required("has_numeric_data", FieldType::Boolean)
                .required("has_temporal_data", FieldType::Boolean)
                .required("has_causal_patterns", FieldType::Boolean),
        ));

        registry.register(Step::function(
            VALIDATE,
            "Cross-check facts against independent sources",
            FunctionName::Validate,
            Schema::new().required("normalized_facts", FieldType::Array),
            Schema::new()
                .required("validated_facts", FieldType::Array)
                .required("validation_ratio", FieldType::Number)
                .required("quality_score", FieldType::Number),
        ));

        registry.register(Step::agent(
            DOMAIN_EXPERT_CRITIQUE,
            "Ask the domain expert to critique tested hypotheses",
            AgentMode::Critique,
            Schema::new()
                .required("topic", FieldType::String)
                .required("hypotheses", FieldType::Array)
                .required("test_results", FieldType::Array),
            Schema::new().required("critiques", FieldType::Array),
        ));

        registry.register(Step::agent(
            KNOWLEDGE_SYNTHESIS,
            "Synthesize the knowledge base from all phase outputs",
            AgentMode::Synthesize,
            Schema::new()
                .required("topic", FieldType::String)
                .required("synthesis_mode", FieldType::String)
                .required("collection_data", FieldType::Object)
                .required("processing_data", FieldType::Object)
                .required("collaboration_data", FieldType::Object),
            Schema::new().required("knowledge_base", FieldType::Object),
        ));

        registry
    }

    /// Add a step, replacing any step with the same name in place.
    pub fn register(&mut self, step: Step) {
        match self.steps.iter_mut().find(|s| s.name() == step.name()) {
            Some(existing) => *existing = step,
            None => self.steps.push(step),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Step> {
        self.steps
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| PipelineError::NotFound(format!("Step not found: {}", name)))
    }

    pub fn has_step(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s.name() == name)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
