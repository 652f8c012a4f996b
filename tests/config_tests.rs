//! Configuration loading from disk and config-driven pipeline runs.

use ares_research::types::{ResearchScope, SynthesisMode};
use ares_research::utils::toml_config::{
    ConfigError, ProviderKind, ResearchConfig, ResearchConfigManager,
};
use ares_research::PipelineOrchestrator;
use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRIPTED_CONFIG: &str = r#"
[pipeline]
step_timeout_secs = 15
expert_questions = 2
default_scope = "comprehensive"
default_max_sources = 4
default_synthesis_mode = "summary"

[llm]
provider = "scripted"
scripted_response = "Which measures reduce emissions fastest?"
executive_summary = false
"#;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("research.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, SCRIPTED_CONFIG);

    let config = ResearchConfig::load(&path).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Scripted);
    assert_eq!(config.pipeline.settings().step_timeout, Duration::from_secs(15));
    assert_eq!(config.pipeline.settings().expert_questions, 2);

    let request = config.pipeline.request("carbon pricing");
    assert_eq!(request.research_topic, "carbon pricing");
    assert_eq!(request.research_scope, ResearchScope::Comprehensive);
    assert_eq!(request.max_sources, 4);
    assert_eq!(request.synthesis_mode, SynthesisMode::Summary);
    assert!(request.enable_agent_conversations);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = ResearchConfig::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn test_invalid_values_fail_load() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[pipeline]\nstep_timeout_secs = 0\n");
    assert!(matches!(
        ResearchConfig::load(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[pipeline\nstep_timeout_secs = ");
    assert!(matches!(ResearchConfig::load(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_manager_reload_keeps_previous_on_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, SCRIPTED_CONFIG);

    let manager = ResearchConfigManager::new(&path).unwrap();
    assert_eq!(manager.config_path(), Some(path.as_path()));
    assert_eq!(manager.config().pipeline.expert_questions, 2);

    let updated = SCRIPTED_CONFIG.replace("expert_questions = 2", "expert_questions = 5");
    fs::write(&path, updated).unwrap();
    manager.reload().unwrap();
    assert_eq!(manager.config().pipeline.expert_questions, 5);

    // Clones share the swapped config.
    let shared = manager.clone();
    fs::write(&path, "[synthesis]\nfallback_confidence = 3.0\n").unwrap();
    assert!(shared.reload().is_err());
    assert_eq!(manager.config().pipeline.expert_questions, 5);
}

#[test]
fn test_in_memory_manager_reload_is_noop() {
    let manager = ResearchConfigManager::from_config(ResearchConfig::default());
    assert!(manager.config_path().is_none());
    assert!(manager.reload().is_ok());
}

#[test]
fn test_orchestrator_from_config() {
    let config = ResearchConfig::from_toml(SCRIPTED_CONFIG).unwrap();
    let orchestrator = PipelineOrchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.settings().expert_questions, 2);
    assert_eq!(orchestrator.settings().step_timeout, Duration::from_secs(15));
}

#[tokio::test]
async fn test_config_driven_run_against_mock_wikipedia() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {
                "pages": [{
                    "pageid": 7,
                    "title": "Carbon pricing",
                    "index": 1,
                    "extract": "Carbon pricing was introduced in Finland in 1990. \
                                Emissions fell by 12 percent because of higher fuel costs.",
                    "fullurl": "https://en.wikipedia.org/wiki/Carbon_pricing",
                    "links": [{"ns": 0, "title": "Carbon tax"}]
                }]
            }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let toml = format!(
        "{SCRIPTED_CONFIG}\n\
         [collectors]\n\
         wikipedia_api_url = \"{}/w/api.php\"\n\
         web_search = false\n\n\
         [persistence]\n\
         dir = \"{}\"\n",
        server.uri(),
        dir.path().join("results").display()
    );
    let config = ResearchConfig::from_toml(&toml).unwrap();
    config.validate().unwrap();

    let orchestrator = PipelineOrchestrator::from_config(&config).unwrap();
    let mut request = config.pipeline.request("carbon pricing");
    request.enable_agent_conversations = false;

    let result = orchestrator.execute(request).await;
    assert!(result.success, "pipeline failed: {:?}", result.error);
    assert_eq!(result.pipeline_metadata.phases_completed, 3);

    let collection = result.results.collection_data.as_ref().unwrap();
    assert_eq!(collection.primary_documents[0].title, "Carbon pricing");
    assert!(result.results.synthesis_data.is_some());

    // The configured persistence directory received the result.
    let saved: Vec<_> = fs::read_dir(dir.path().join("results")).unwrap().collect();
    assert_eq!(saved.len(), 1);
}
