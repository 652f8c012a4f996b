//! Test doubles shared across the integration tests.
//!
//! Collectors return fixed documents (or fail on demand), and the
//! orchestrator helper wires them into a pipeline with the real processing
//! functions and a scripted language model.

#![allow(dead_code)]

use ares_research::agents::{
    AgentMode, AgentRegistry, CollectorAgent, DomainExpertAgent, ResearchAgent, SynthesisAgent,
};
use ares_research::collectors::{CollectionRequest, CollectorClient, PatternTextAnalyzer};
use ares_research::llm::{
    GenerationParams, LanguageModelClient, LanguageModelResponse, ScriptedLanguageModel,
};
use ares_research::pipeline::{OrchestratorSettings, PipelineOrchestrator};
use ares_research::processing::FunctionRegistry;
use ares_research::steps::{DelegateResponse, Params};
use ares_research::synthesis::KnowledgeSynthesizer;
use ares_research::types::{PipelineError, Result, SourceDocument, SourceType};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Collector returning a fixed document list, or failing every call.
pub struct StaticCollector {
    name: String,
    source_type: SourceType,
    documents: Vec<SourceDocument>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl StaticCollector {
    pub fn new(name: &str, source_type: SourceType, documents: Vec<SourceDocument>) -> Self {
        Self {
            name: name.to_string(),
            source_type,
            documents,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(name, SourceType::Web, Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollectorClient for StaticCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn collect(&self, request: &CollectionRequest) -> Result<Vec<SourceDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(PipelineError::Network(message.clone()));
        }
        Ok(self
            .documents
            .iter()
            .take(request.max_sources)
            .cloned()
            .collect())
    }
}

/// Agent that reports `success = false` for the synthesis mode.
pub struct FailingSynthesisAgent;

#[async_trait]
impl ResearchAgent for FailingSynthesisAgent {
    fn name(&self) -> &str {
        "failing_synthesizer"
    }

    fn modes(&self) -> &[AgentMode] {
        &[AgentMode::Synthesize]
    }

    async fn activate(&self, _mode: AgentMode, _params: Params) -> Result<DelegateResponse> {
        Ok(DelegateResponse::failure("synthesis backend unavailable"))
    }
}

/// Model that answers only after `delay`.
pub struct SlowModel {
    pub delay: Duration,
}

#[async_trait]
impl LanguageModelClient for SlowModel {
    async fn complete(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<LanguageModelResponse> {
        tokio::time::sleep(self.delay).await;
        Ok(LanguageModelResponse::success("A late summary."))
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

pub fn primary_article() -> SourceDocument {
    SourceDocument::new(
        "wikipedia_1",
        "Climate policy",
        "Climate policy covers the measures governments use to reduce emissions. \
         The Paris Agreement was adopted in 2015 and commits countries to limit warming. \
         Carbon pricing results in lower emissions because of higher fossil fuel costs. \
         Emissions in the European Union fell by 24 percent between 1990 and 2019.",
        SourceType::Encyclopedia,
        0.9,
    )
    .with_references(vec![
        "Carbon tax".to_string(),
        "Paris Agreement".to_string(),
        "Emissions trading".to_string(),
        "Renewable energy".to_string(),
    ])
}

pub fn secondary_articles() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new(
            "wikipedia_2",
            "Carbon tax",
            "A carbon tax is a tax levied on the carbon emissions of fuels. \
             Sweden introduced a carbon tax in 1991 and emissions fell by 27 percent since then.",
            SourceType::Encyclopedia,
            0.8,
        ),
        SourceDocument::new(
            "web_001",
            "Carbon pricing dashboard",
            "Carbon pricing now covers 23 percent of global emissions. \
             The Paris Agreement targets are compared across countries every year.",
            SourceType::Web,
            0.8,
        ),
    ]
}

/// Collector agent over the standard fixture documents.
pub fn fixture_collectors() -> CollectorAgent {
    CollectorAgent::new(Arc::new(StaticCollector::new(
        "fixture_wikipedia",
        SourceType::Encyclopedia,
        vec![primary_article()],
    )))
    .with_secondary(Arc::new(StaticCollector::new(
        "fixture_secondary",
        SourceType::Encyclopedia,
        secondary_articles(),
    )))
}

pub fn scripted_model() -> Arc<ScriptedLanguageModel> {
    Arc::new(
        ScriptedLanguageModel::new("How strongly does carbon pricing reduce emissions?")
            .with_rule(
                "Hypotheses under review",
                "Be more specific about which countries are covered",
            )
            .with_rule("how strongly", "Carbon pricing reduced emissions where prices were high."),
    )
}

pub fn test_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        step_timeout: Duration::from_secs(5),
        expert_questions: 2,
    }
}

/// Full agent set: fixture collectors, domain expert and synthesizer.
pub fn standard_agents(llm: Arc<dyn LanguageModelClient>) -> AgentRegistry {
    AgentRegistry::new()
        .with_agent(Arc::new(fixture_collectors()))
        .with_agent(Arc::new(DomainExpertAgent::new(llm)))
        .with_agent(Arc::new(SynthesisAgent::new(KnowledgeSynthesizer::default())))
}

pub fn standard_functions() -> Arc<FunctionRegistry> {
    Arc::new(FunctionRegistry::standard(Arc::new(
        PatternTextAnalyzer::new().expect("analyzer patterns compile"),
    )))
}

pub fn orchestrator(
    agents: AgentRegistry,
    llm: Arc<dyn LanguageModelClient>,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(agents, standard_functions(), llm).with_settings(test_settings())
}
