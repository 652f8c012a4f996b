//! Research pipeline orchestration.
//!
//! [`PipelineOrchestrator::execute`] runs the fixed phase sequence
//! Collection → Processing → Collaboration → Synthesis and always returns a
//! [`PipelineResult`]:
//!
//! - Collection and Processing failures abort the run with
//!   `success = false` and whatever partial data was gathered.
//! - Collaboration failures are logged and replaced by an empty result.
//! - Synthesis failures fall back to a knowledge base built from the raw
//!   collection data.

pub mod collaboration;
pub mod context;
pub mod data;

pub use collaboration::Collaboration;
pub use context::{PhaseTiming, PipelineContext, PipelinePhase};
pub use data::{CollaborationData, CollectionData, ProcessingData};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::collector::CollectorAgent;
use crate::agents::critic::DomainExpertAgent;
use crate::agents::synthesis::{ExecutiveSummarizer, SynthesisAgent};
use crate::agents::AgentRegistry;
use crate::collectors::analysis::PatternTextAnalyzer;
use crate::collectors::web::WebSearchCollector;
use crate::collectors::wikipedia::WikipediaCollector;
use crate::conversation::ConversationCoordinator;
use crate::hypothesis::HypothesisEngine;
use crate::llm::LanguageModelClient;
use crate::persistence::{JsonFilePersistence, PersistenceClient};
use crate::processing::FunctionRegistry;
use crate::steps::registry::{
    DOMAIN_EXPERT_CRITIQUE, KNOWLEDGE_SYNTHESIS, PRIMARY_SOURCE_LOOKUP, PROCESSING_CHAIN,
    SECONDARY_SOURCE_DISCOVERY,
};
use crate::steps::{FunctionActivator, Params, StepContext, StepRegistry};
use crate::synthesis::{KnowledgeBase, KnowledgeSynthesizer};
use crate::types::{PipelineError, ResearchScope, Result, SynthesisMode};
use crate::utils::toml_config::ResearchConfig;

use data::{from_params, to_params};

/// Input to one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub research_topic: String,
    #[serde(default)]
    pub research_scope: ResearchScope,
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
    #[serde(default = "default_true")]
    pub enable_agent_conversations: bool,
    #[serde(default)]
    pub synthesis_mode: SynthesisMode,
}

fn default_max_sources() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl PipelineRequest {
    pub fn new(research_topic: impl Into<String>) -> Self {
        Self {
            research_topic: research_topic.into(),
            research_scope: ResearchScope::default(),
            max_sources: default_max_sources(),
            enable_agent_conversations: true,
            synthesis_mode: SynthesisMode::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.research_topic.trim().is_empty() {
            return Err(PipelineError::InvalidInput("research_topic must not be empty".to_string()));
        }
        if self.max_sources == 0 {
            return Err(PipelineError::InvalidInput("max_sources must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub phases_completed: usize,
    pub completed_phases: Vec<PipelinePhase>,
    pub final_phase: PipelinePhase,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub phase_timings: Vec<PhaseTiming>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_data: Option<CollectionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_data: Option<ProcessingData>,
    #[serde(default)]
    pub collaboration_data: CollaborationData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_data: Option<KnowledgeBase>,
}

/// Outcome of one pipeline run. Produced for failed runs too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    pub research_topic: String,
    /// Wall-clock seconds.
    pub execution_time: f64,
    pub pipeline_metadata: PipelineMetadata,
    pub results: PipelineResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Limits applied to every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    pub step_timeout: Duration,
    pub expert_questions: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(60),
            expert_questions: 3,
        }
    }
}

/// Sequences the pipeline phases over a fixed step registry.
///
/// The orchestrator holds no per-run state; each [`execute`](Self::execute)
/// call builds its own [`PipelineContext`] and conversation log, so one
/// orchestrator can serve concurrent runs.
pub struct PipelineOrchestrator {
    steps: StepRegistry,
    agents: Arc<AgentRegistry>,
    functions: Arc<dyn FunctionActivator>,
    llm: Arc<dyn LanguageModelClient>,
    engine: HypothesisEngine,
    synthesizer: KnowledgeSynthesizer,
    settings: OrchestratorSettings,
    summarizer: Option<ExecutiveSummarizer>,
    persistence: Option<Arc<dyn PersistenceClient>>,
}

impl PipelineOrchestrator {
    pub fn new(
        agents: AgentRegistry,
        functions: Arc<dyn FunctionActivator>,
        llm: Arc<dyn LanguageModelClient>,
    ) -> Self {
        Self {
            steps: StepRegistry::standard(),
            agents: Arc::new(agents),
            functions,
            llm,
            engine: HypothesisEngine::default(),
            synthesizer: KnowledgeSynthesizer::default(),
            settings: OrchestratorSettings::default(),
            summarizer: None,
            persistence: None,
        }
    }

    /// Wire every collaborator from configuration.
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let llm = config.llm.provider()?.create_client()?;
        let synthesizer = config.synthesis.synthesizer();

        let wikipedia: Arc<WikipediaCollector> = Arc::new(WikipediaCollector::new(
            config.collectors.wikipedia_api_url.clone(),
            Duration::from_secs(config.collectors.http_timeout_secs),
        )?);
        let mut collector = CollectorAgent::new(wikipedia.clone()).with_secondary(wikipedia);
        if config.collectors.web_search {
            let web = WebSearchCollector::new(config.collectors.web_results);
            collector = collector.with_secondary(Arc::new(web));
        }

        let agents = AgentRegistry::new()
            .with_agent(Arc::new(collector))
            .with_agent(Arc::new(DomainExpertAgent::new(llm.clone())))
            .with_agent(Arc::new(SynthesisAgent::new(synthesizer.clone())));
        let functions = FunctionRegistry::standard(Arc::new(PatternTextAnalyzer::new()?));

        let settings = config.pipeline.settings();
        let mut orchestrator = Self::new(agents, Arc::new(functions), llm.clone())
            .with_synthesizer(synthesizer)
            .with_settings(settings);
        if config.llm.executive_summary {
            let summarizer = ExecutiveSummarizer::new(llm, settings.step_timeout);
            orchestrator = orchestrator.with_summarizer(summarizer);
        }
        if let Some(persistence) = &config.persistence {
            let store = JsonFilePersistence::new(&persistence.dir);
            orchestrator = orchestrator.with_persistence(Arc::new(store));
        }
        Ok(orchestrator)
    }

    pub fn with_steps(mut self, steps: StepRegistry) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_engine(mut self, engine: HypothesisEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: KnowledgeSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Attach an executive summary to every knowledge base, fallback included.
    pub fn with_summarizer(mut self, summarizer: ExecutiveSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    fn step_context(&self) -> StepContext<'_> {
        StepContext {
            agents: self.agents.as_ref(),
            functions: self.functions.as_ref(),
            timeout: self.settings.step_timeout,
        }
    }

    /// Run the full pipeline for `request`. Never fails: errors are reported
    /// in the returned result.
    pub async fn execute(&self, request: PipelineRequest) -> PipelineResult {
        let mut ctx = PipelineContext::new(&request, Arc::clone(&self.agents));
        let mut results = PipelineResults::default();

        info!(
            topic = %ctx.research_topic,
            scope = ctx.research_scope.as_str(),
            max_sources = ctx.max_sources,
            conversations = ctx.enable_agent_conversations,
            "Starting research pipeline"
        );

        if let Err(e) = request.validate() {
            error!(error = %e, "Rejected pipeline request");
            ctx.fail();
            return self.finish(ctx, results, Some(e)).await;
        }

        // Collection
        ctx.advance();
        if let Err(e) = self.collect(&ctx, &mut results.collection_data).await {
            return self.abort(ctx, results, e).await;
        }
        ctx.complete_phase();
        let collection = results.collection_data.clone().unwrap_or_default();

        // Processing
        ctx.advance();
        if let Err(e) = self.process(&ctx, &collection, &mut results.processing_data).await {
            return self.abort(ctx, results, e).await;
        }
        ctx.complete_phase();
        let processing = results.processing_data.clone().unwrap_or_default();

        // Collaboration
        if ctx.advance() == PipelinePhase::Collaboration {
            match self.collaborate(&ctx, &collection, &processing).await {
                Ok(data) => {
                    results.collaboration_data = data;
                    ctx.complete_phase();
                }
                Err(e) => {
                    warn!(error = %e, "Agent collaboration failed, continuing without it");
                    ctx.skip_phase(e.in_phase(PipelinePhase::Collaboration).to_string());
                }
            }
            ctx.advance();
        }

        // Synthesis
        let mut knowledge_base = match self
            .synthesize(&ctx, &collection, &processing, &results.collaboration_data)
            .await
        {
            Ok(kb) => kb,
            Err(e) => {
                warn!(error = %e, "Knowledge synthesis failed, using fallback synthesis");
                let e = e.in_phase(PipelinePhase::Synthesis);
                ctx.warn(format!("{}; fallback knowledge base used", e));
                self.synthesizer
                    .fallback(&ctx.research_topic, ctx.synthesis_mode, &collection)
            }
        };
        if let Some(summarizer) = &self.summarizer {
            knowledge_base.executive_summary = summarizer.summarize(&knowledge_base).await;
        }
        results.synthesis_data = Some(knowledge_base);
        ctx.complete_phase();
        ctx.advance();

        info!(
            topic = %ctx.research_topic,
            phases = ctx.completed_phases().len(),
            elapsed_secs = ctx.elapsed().as_secs_f64(),
            "Research pipeline completed"
        );
        self.finish(ctx, results, None).await
    }

    async fn abort(
        &self,
        mut ctx: PipelineContext,
        results: PipelineResults,
        err: PipelineError,
    ) -> PipelineResult {
        let err = err.in_phase(ctx.phase());
        error!(error = %err, "Research pipeline aborted");
        ctx.fail();
        self.finish(ctx, results, Some(err)).await
    }

    /// Primary lookup, then secondary discovery seeded by its references.
    /// `out` holds whatever was collected when an error is returned.
    async fn collect(&self, ctx: &PipelineContext, out: &mut Option<CollectionData>) -> Result<()> {
        let step_ctx = self.step_context();
        let base = json!({
            "topic": ctx.research_topic,
            "scope": ctx.research_scope.as_str(),
            "max_sources": ctx.max_sources,
        });

        let primary_output = self
            .steps
            .get(PRIMARY_SOURCE_LOOKUP)?
            .run(to_params(&base)?, &step_ctx)
            .await?;
        let primary: PrimaryOutput = from_params(&primary_output)?;
        let collection = out.insert(CollectionData {
            primary_documents: primary.documents,
            secondary_documents: Vec::new(),
            references: primary.references,
        });

        // `max_sources` caps primary and secondary documents together.
        let remaining = ctx.max_sources.saturating_sub(collection.primary_documents.len());
        if remaining == 0 {
            info!(
                max_sources = ctx.max_sources,
                "Source budget spent, skipping secondary discovery"
            );
        } else {
            let mut secondary_input = to_params(&base)?;
            secondary_input.insert("max_sources".to_string(), json!(remaining));
            secondary_input.insert("references".to_string(), json!(collection.references));
            let secondary_output = self
                .steps
                .get(SECONDARY_SOURCE_DISCOVERY)?
                .run(secondary_input, &step_ctx)
                .await?;
            let secondary: DocumentsOutput = from_params(&secondary_output)?;
            collection.secondary_documents = secondary.documents;
        }

        info!(
            primary = collection.primary_documents.len(),
            secondary = collection.secondary_documents.len(),
            references = collection.references.len(),
            "Collection phase complete"
        );
        Ok(())
    }

    /// Runs the processing chain. Each step sees every earlier output.
    async fn process(
        &self,
        ctx: &PipelineContext,
        collection: &CollectionData,
        out: &mut Option<ProcessingData>,
    ) -> Result<()> {
        let step_ctx = self.step_context();
        let mut accumulated: Params = to_params(&json!({
            "topic": ctx.research_topic,
            "documents": collection.all_documents().collect::<Vec<_>>(),
        }))?;

        for name in PROCESSING_CHAIN {
            let step = self.steps.get(name)?;
            match step.run(accumulated.clone(), &step_ctx).await {
                Ok(output) => accumulated.extend(output),
                Err(e) => {
                    *out = from_params(&accumulated).ok();
                    return Err(e);
                }
            }
        }

        let processing: ProcessingData = from_params(&accumulated)?;
        info!(
            facts = processing.normalized_facts.len(),
            validated = processing.validated_facts.len(),
            quality = processing.quality_score,
            "Processing phase complete"
        );
        *out = Some(processing);
        Ok(())
    }

    async fn collaborate(
        &self,
        ctx: &PipelineContext,
        collection: &CollectionData,
        processing: &ProcessingData,
    ) -> Result<CollaborationData> {
        let project_id = format!("research_{}", Uuid::new_v4().simple());
        let coordinator = ConversationCoordinator::new(project_id);
        let step_ctx = self.step_context();
        Collaboration {
            topic: &ctx.research_topic,
            collection,
            processing,
            coordinator: &coordinator,
            llm: self.llm.as_ref(),
            engine: &self.engine,
            critique_step: self.steps.get(DOMAIN_EXPERT_CRITIQUE)?,
            step_ctx: &step_ctx,
            expert_questions: self.settings.expert_questions,
        }
        .run()
        .await
    }

    async fn synthesize(
        &self,
        ctx: &PipelineContext,
        collection: &CollectionData,
        processing: &ProcessingData,
        collaboration: &CollaborationData,
    ) -> Result<KnowledgeBase> {
        let input = to_params(&json!({
            "topic": ctx.research_topic,
            "synthesis_mode": ctx.synthesis_mode.as_str(),
            "collection_data": collection,
            "processing_data": processing,
            "collaboration_data": collaboration,
        }))?;
        let output = self
            .steps
            .get(KNOWLEDGE_SYNTHESIS)?
            .run(input, &self.step_context())
            .await?;
        let synthesis: SynthesisOutput = from_params(&output)?;
        Ok(synthesis.knowledge_base)
    }

    async fn finish(
        &self,
        ctx: PipelineContext,
        results: PipelineResults,
        error: Option<PipelineError>,
    ) -> PipelineResult {
        let mut result = PipelineResult {
            success: error.is_none(),
            research_topic: ctx.research_topic.clone(),
            execution_time: ctx.elapsed().as_secs_f64(),
            pipeline_metadata: PipelineMetadata {
                phases_completed: ctx.completed_phases().len(),
                completed_phases: ctx.completed_phases().to_vec(),
                final_phase: ctx.phase(),
                start_time: ctx.start_time,
                end_time: Utc::now(),
                phase_timings: ctx.timings().to_vec(),
                warnings: ctx.warnings().to_vec(),
            },
            results,
            error: error.map(|e| e.to_string()),
        };

        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save(&result).await {
                warn!(error = %e, "Failed to persist pipeline result");
                result
                    .pipeline_metadata
                    .warnings
                    .push(format!("Result not persisted: {e}"));
            }
        }
        result
    }
}

#[derive(Debug, Deserialize)]
struct PrimaryOutput {
    documents: Vec<crate::types::SourceDocument>,
    references: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentsOutput {
    documents: Vec<crate::types::SourceDocument>,
}

#[derive(Debug, Deserialize)]
struct SynthesisOutput {
    knowledge_base: KnowledgeBase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let request: PipelineRequest =
            serde_json::from_str(r#"{"research_topic": "climate policy"}"#).unwrap();
        assert_eq!(request, PipelineRequest::new("climate policy"));
        assert_eq!(request.research_scope, ResearchScope::Narrow);
        assert!(request.enable_agent_conversations);
    }

    #[test]
    fn test_request_rejects_unknown_scope() {
        let err = serde_json::from_str::<PipelineRequest>(
            r#"{"research_topic": "climate policy", "research_scope": "galactic"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_request_validation() {
        assert!(PipelineRequest::new("  ").validate().is_err());
        let request = PipelineRequest {
            max_sources: 0,
            ..PipelineRequest::new("climate policy")
        };
        assert!(request.validate().is_err());
        assert!(PipelineRequest::new("climate policy").validate().is_ok());
    }
}
