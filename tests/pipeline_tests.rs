//! End-to-end pipeline runs over fixture collectors and a scripted model.

mod common;

use ares_research::agents::{
    AgentRegistry, CollectorAgent, DomainExpertAgent, ExecutiveSummarizer, SynthesisAgent,
};
use ares_research::conversation::MessageType;
use ares_research::persistence::{JsonFilePersistence, PersistenceClient};
use ares_research::pipeline::{OrchestratorSettings, PipelinePhase, PipelineRequest};
use ares_research::steps::{DelegateResponse, FunctionActivator, Params};
use ares_research::processing::FunctionName;
use ares_research::synthesis::{CreationMethod, KnowledgeSynthesizer};
use ares_research::types::{Result, SourceDocument, SourceType, SynthesisMode};
use ares_research::PipelineOrchestrator;
use async_trait::async_trait;
use common::mocks::*;
use std::sync::Arc;
use std::time::Duration;

fn request(topic: &str, conversations: bool) -> PipelineRequest {
    PipelineRequest {
        enable_agent_conversations: conversations,
        ..PipelineRequest::new(topic)
    }
}

#[tokio::test]
async fn test_run_without_conversations() {
    let llm = scripted_model();
    let orchestrator = orchestrator(standard_agents(llm.clone()), llm.clone());

    let result = orchestrator.execute(request("climate policy", false)).await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    assert_eq!(result.research_topic, "climate policy");
    assert!((3..=4).contains(&result.pipeline_metadata.phases_completed));
    assert_eq!(
        result.pipeline_metadata.completed_phases,
        vec![
            PipelinePhase::Collection,
            PipelinePhase::Processing,
            PipelinePhase::Synthesis
        ]
    );
    assert_eq!(result.pipeline_metadata.final_phase, PipelinePhase::Completed);
    assert!(result.results.collaboration_data.is_empty());
    assert!(result.results.synthesis_data.is_some());
    assert_eq!(llm.call_count(), 0);

    let collection = result.results.collection_data.unwrap();
    assert_eq!(collection.primary_documents.len(), 1);
    assert_eq!(collection.secondary_documents.len(), 2);
    // Narrow scope follows three references.
    assert_eq!(collection.references.len(), 3);
}

#[tokio::test]
async fn test_secondary_collection_failure_is_fatal() {
    let collector = CollectorAgent::new(Arc::new(StaticCollector::new(
        "fixture_wikipedia",
        SourceType::Encyclopedia,
        vec![primary_article()],
    )))
    .with_secondary(Arc::new(StaticCollector::failing("web", "connection reset")));
    let llm = scripted_model();
    let agents = AgentRegistry::new()
        .with_agent(Arc::new(collector))
        .with_agent(Arc::new(SynthesisAgent::new(KnowledgeSynthesizer::default())));

    let result = orchestrator(agents, llm).execute(request("climate policy", true)).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("failed"), "error was: {error}");
    assert!(error.starts_with("Collection phase failed"));
    assert_eq!(result.pipeline_metadata.phases_completed, 0);
    assert_eq!(result.pipeline_metadata.final_phase, PipelinePhase::Failed);

    let collection = result.results.collection_data.unwrap();
    assert_eq!(collection.primary_documents.len(), 1);
    assert!(collection.secondary_documents.is_empty());
    assert!(result.results.processing_data.is_none());
    assert!(result.results.synthesis_data.is_none());
}

#[tokio::test]
async fn test_missing_primary_article_is_fatal() {
    let collector = CollectorAgent::new(Arc::new(StaticCollector::new(
        "empty",
        SourceType::Encyclopedia,
        Vec::new(),
    )));
    let llm = scripted_model();
    let agents = AgentRegistry::new().with_agent(Arc::new(collector));

    let result = orchestrator(agents, llm).execute(request("unknown topic", false)).await;

    assert!(!result.success);
    assert!(result.results.collection_data.is_none());
    assert!(result.error.unwrap().contains("primary_source_lookup"));
}

#[tokio::test]
async fn test_synthesis_failure_uses_fallback() {
    let documents = vec![
        SourceDocument::new(
            "d1",
            "Climate policy",
            "Emissions fell by 24 percent.",
            SourceType::Encyclopedia,
            0.8,
        )
        .with_references(vec!["Carbon tax".to_string()]),
        SourceDocument::new(
            "d2",
            "Carbon tax",
            "Sweden taxed carbon in 1991.",
            SourceType::Encyclopedia,
            0.8,
        ),
    ];
    let collector = CollectorAgent::new(Arc::new(StaticCollector::new(
        "primary",
        SourceType::Encyclopedia,
        vec![documents[0].clone()],
    )))
    .with_secondary(Arc::new(StaticCollector::new(
        "secondary",
        SourceType::Encyclopedia,
        vec![documents[1].clone()],
    )));
    let llm = scripted_model();
    let agents = AgentRegistry::new()
        .with_agent(Arc::new(collector))
        .with_agent(Arc::new(FailingSynthesisAgent));

    let result = orchestrator(agents, llm).execute(request("climate policy", false)).await;

    assert!(result.success);
    assert!(result.error.is_none());
    let kb = result.results.synthesis_data.unwrap();
    assert_eq!(kb.creation_method, CreationMethod::FallbackSynthesis);
    assert_eq!(kb.overall_confidence, 0.6);
    assert_eq!(kb.elements.len(), 2);
    assert!(result
        .pipeline_metadata
        .warnings
        .iter()
        .any(|w| w.contains("fallback")));
    assert!(result
        .pipeline_metadata
        .completed_phases
        .contains(&PipelinePhase::Synthesis));
}

#[tokio::test]
async fn test_full_run_with_collaboration() {
    let llm = scripted_model();
    let orchestrator = orchestrator(standard_agents(llm.clone()), llm.clone());

    let result = orchestrator.execute(request("climate policy", true)).await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    assert_eq!(result.pipeline_metadata.phases_completed, 4);

    let collaboration = &result.results.collaboration_data;
    assert!(!collaboration.hypotheses.is_empty());
    assert_eq!(collaboration.test_results.len(), collaboration.hypotheses.len());
    assert!(!collaboration.insights.is_empty());

    // Two expert questions recorded first, in order, then their answers.
    let conversations = &collaboration.conversations;
    let questions: Vec<_> = conversations
        .iter()
        .filter(|c| c.message_type == MessageType::Question)
        .collect();
    assert_eq!(questions.len(), 2);
    assert_eq!(conversations[0].message_type, MessageType::Question);
    assert_eq!(conversations[1].message_type, MessageType::Question);
    assert_eq!(conversations[0].context_data["index"], 0);
    assert_eq!(conversations[1].context_data["index"], 1);
    assert_eq!(conversations[2].message_type, MessageType::Analysis);
    assert_eq!(
        conversations[2].content,
        "Carbon pricing reduced emissions where prices were high."
    );

    for window in conversations.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }
    for c in conversations {
        assert_eq!(c.response_required, c.message_type.requires_response());
    }

    let insight_recipients: Vec<&str> = conversations
        .iter()
        .filter(|c| c.message_type == MessageType::Insight)
        .map(|c| c.agent_to.as_str())
        .take(3)
        .collect();
    assert_eq!(insight_recipients, vec!["domain_expert", "hypothesis_generator", "critic"]);

    let kb = result.results.synthesis_data.unwrap();
    assert_eq!(kb.creation_method, CreationMethod::Synthesis);
    assert!((0.0..=1.0).contains(&kb.overall_confidence));
}

#[tokio::test]
async fn test_critique_feeds_refinement() {
    let llm = scripted_model();
    let result = orchestrator(standard_agents(llm.clone()), llm.clone())
        .execute(request("climate policy", true))
        .await;

    let collaboration = result.results.collaboration_data;
    assert!(!collaboration.critiques.is_empty());
    // The scripted critique applies to every hypothesis and asks for specificity.
    assert_eq!(collaboration.refined_hypotheses.len(), collaboration.hypotheses.len());
    for refined in &collaboration.refined_hypotheses {
        assert_eq!(refined.version, 2);
        assert!(refined.statement.starts_with("Specifically, "));
        let link = refined.refinement.as_ref().unwrap();
        assert!(collaboration.hypotheses.iter().any(|h| h.id == link.original_id));
    }
}

#[tokio::test]
async fn test_collaboration_failure_is_not_fatal() {
    // No domain expert registered: the critique step cannot run.
    let llm = scripted_model();
    let agents = AgentRegistry::new()
        .with_agent(Arc::new(fixture_collectors()))
        .with_agent(Arc::new(SynthesisAgent::new(KnowledgeSynthesizer::default())));

    let result = orchestrator(agents, llm).execute(request("climate policy", true)).await;

    assert!(result.success);
    assert_eq!(result.pipeline_metadata.phases_completed, 3);
    assert!(result.results.collaboration_data.is_empty());
    assert!(result
        .pipeline_metadata
        .warnings
        .iter()
        .any(|w| w.starts_with("Collaboration phase failed")));
    assert_eq!(
        result.results.synthesis_data.unwrap().creation_method,
        CreationMethod::Synthesis
    );
}

#[tokio::test]
async fn test_expert_model_errors_do_not_fail_collaboration() {
    let llm = Arc::new(ares_research::ScriptedLanguageModel::failing("model offline"));
    let orchestrator = orchestrator(standard_agents(llm.clone()), llm);

    let result = orchestrator.execute(request("climate policy", true)).await;

    // Questions are skipped, but the critique step reports failure.
    assert!(result.success);
    assert!(result.results.collaboration_data.is_empty());
    assert_eq!(result.pipeline_metadata.phases_completed, 3);
}

struct BrokenFunctions;

#[async_trait]
impl FunctionActivator for BrokenFunctions {
    async fn call(&self, function: FunctionName, _params: Params) -> Result<DelegateResponse> {
        Ok(DelegateResponse::failure(format!("{} unavailable", function.as_str())))
    }
}

#[tokio::test]
async fn test_processing_failure_is_fatal() {
    let llm = scripted_model();
    let agents = standard_agents(llm.clone());
    let orchestrator = PipelineOrchestrator::new(agents, Arc::new(BrokenFunctions), llm)
        .with_settings(test_settings());

    let result = orchestrator.execute(request("climate policy", true)).await;

    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Processing phase failed"));
    assert_eq!(
        result.pipeline_metadata.completed_phases,
        vec![PipelinePhase::Collection]
    );
    assert!(result.results.collection_data.is_some());
    assert!(result.results.synthesis_data.is_none());
}

#[tokio::test]
async fn test_invalid_request_fails_before_collection() {
    let llm = scripted_model();
    let result = orchestrator(standard_agents(llm.clone()), llm)
        .execute(PipelineRequest::new("   "))
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("research_topic"));
    assert!(result.results.collection_data.is_none());
}

#[tokio::test]
async fn test_summary_mode_limits_elements() {
    let llm = scripted_model();
    let agents = AgentRegistry::new()
        .with_agent(Arc::new(fixture_collectors()))
        .with_agent(Arc::new(DomainExpertAgent::new(llm.clone())))
        .with_agent(Arc::new(SynthesisAgent::new(KnowledgeSynthesizer::new(
            Default::default(),
            0.6,
            2,
        ))));

    let result = orchestrator(agents, llm)
        .execute(PipelineRequest {
            synthesis_mode: SynthesisMode::Summary,
            ..request("climate policy", false)
        })
        .await;

    let kb = result.results.synthesis_data.unwrap();
    assert_eq!(kb.synthesis_mode, SynthesisMode::Summary);
    assert!(kb.elements.len() <= 2);
}

#[tokio::test]
async fn test_result_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFilePersistence::new(dir.path()));
    let llm = scripted_model();
    let orchestrator =
        orchestrator(standard_agents(llm.clone()), llm).with_persistence(store.clone());

    let result = orchestrator.execute(request("climate policy", false)).await;
    assert!(result.success);

    let keys = store.list().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("climate_policy_"));
    let loaded = store.load(&keys[0]).await.unwrap();
    assert_eq!(loaded.research_topic, result.research_topic);
    assert_eq!(loaded.pipeline_metadata.phases_completed, 3);
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let llm = scripted_model();
    let orchestrator = Arc::new(orchestrator(standard_agents(llm.clone()), llm));

    let (a, b) = tokio::join!(
        orchestrator.execute(request("climate policy", true)),
        orchestrator.execute(request("carbon tax", true)),
    );

    assert!(a.success && b.success);
    let a_projects: Vec<_> = a
        .results
        .collaboration_data
        .conversations
        .iter()
        .map(|c| c.project_id.clone())
        .collect();
    let b_projects: Vec<_> = b
        .results
        .collaboration_data
        .conversations
        .iter()
        .map(|c| c.project_id.clone())
        .collect();
    assert!(a_projects.windows(2).all(|w| w[0] == w[1]));
    assert!(!b_projects.is_empty() && !a_projects.contains(&b_projects[0]));
}

#[tokio::test]
async fn test_slow_summary_keeps_synthesized_knowledge_base() {
    let llm = scripted_model();
    let settings = OrchestratorSettings {
        step_timeout: Duration::from_secs(1),
        expert_questions: 2,
    };
    let slow = Arc::new(SlowModel {
        delay: Duration::from_secs(3),
    });
    let orchestrator = orchestrator(standard_agents(llm.clone()), llm)
        .with_settings(settings)
        .with_summarizer(ExecutiveSummarizer::new(slow, settings.step_timeout));

    let result = orchestrator.execute(request("climate policy", false)).await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    assert!(
        result.pipeline_metadata.warnings.is_empty(),
        "warnings: {:?}",
        result.pipeline_metadata.warnings
    );
    let kb = result.results.synthesis_data.unwrap();
    assert_eq!(kb.creation_method, CreationMethod::Synthesis);
    assert!(kb.executive_summary.is_none());
}

#[tokio::test]
async fn test_summary_attached_after_synthesis() {
    let llm = scripted_model();
    let summaries = Arc::new(ares_research::ScriptedLanguageModel::new(
        "Carbon pricing works where prices are high.",
    ));
    let orchestrator = orchestrator(standard_agents(llm.clone()), llm)
        .with_summarizer(ExecutiveSummarizer::new(summaries.clone(), Duration::from_secs(1)));

    let result = orchestrator.execute(request("climate policy", false)).await;

    let kb = result.results.synthesis_data.unwrap();
    assert_eq!(kb.creation_method, CreationMethod::Synthesis);
    assert_eq!(
        kb.executive_summary.as_deref(),
        Some("Carbon pricing works where prices are high.")
    );
    assert_eq!(summaries.call_count(), 1);
}

#[tokio::test]
async fn test_max_sources_caps_all_documents() {
    let llm = scripted_model();
    let orchestrator = orchestrator(standard_agents(llm.clone()), llm);

    let result = orchestrator
        .execute(PipelineRequest {
            max_sources: 2,
            ..request("climate policy", false)
        })
        .await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    let collection = result.results.collection_data.unwrap();
    assert_eq!(collection.primary_documents.len(), 1);
    assert_eq!(collection.secondary_documents.len(), 1);
    assert_eq!(collection.all_documents().count(), 2);
}

#[tokio::test]
async fn test_single_source_skips_secondary_discovery() {
    let secondary = Arc::new(StaticCollector::new(
        "fixture_secondary",
        SourceType::Encyclopedia,
        secondary_articles(),
    ));
    let collector = CollectorAgent::new(Arc::new(StaticCollector::new(
        "fixture_wikipedia",
        SourceType::Encyclopedia,
        vec![primary_article()],
    )))
    .with_secondary(secondary.clone());
    let llm = scripted_model();
    let agents = AgentRegistry::new()
        .with_agent(Arc::new(collector))
        .with_agent(Arc::new(SynthesisAgent::new(KnowledgeSynthesizer::default())));

    let result = orchestrator(agents, llm)
        .execute(PipelineRequest {
            max_sources: 1,
            ..request("climate policy", false)
        })
        .await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    let collection = result.results.collection_data.unwrap();
    assert_eq!(collection.primary_documents.len(), 1);
    assert!(collection.secondary_documents.is_empty());
    assert_eq!(secondary.calls(), 0);
}
