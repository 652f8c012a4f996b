//! LLM client tests
//!
//! The OpenAI-compatible client is exercised against a wiremock server; the
//! scripted model through the provider factory.

use ares_research::llm::{
    CompletionStatus, GenerationParams, LanguageModelClient, OpenAICompatibleClient, Provider,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, api_key: &str) -> OpenAICompatibleClient {
    OpenAICompatibleClient::new(
        api_key.to_string(),
        format!("{}/v1/", server.uri()),
        "gpt-4o-mini".to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_chat_completion_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "You are a domain expert."},
                {"role": "user", "content": "What drives emissions?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Energy use."}},
                {"index": 1, "message": {"role": "assistant", "content": "Ignored."}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = GenerationParams::default().with_system("You are a domain expert.");
    let response = client(&server, "sk-test")
        .complete("What drives emissions?", &params)
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.text, "Energy use.");
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_rejected_request_is_error_status_not_err() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let response = client(&server, "sk-test")
        .complete("hello", &GenerationParams::default())
        .await
        .unwrap();

    assert_eq!(response.status, CompletionStatus::Error);
    let error = response.error.unwrap();
    assert!(error.contains("429"));
    assert!(error.contains("rate limited"));
}

#[tokio::test]
async fn test_empty_choices_reports_no_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let response = client(&server, "")
        .complete("hello", &GenerationParams::default())
        .await
        .unwrap();

    assert!(!response.is_success());
    assert_eq!(response.error.as_deref(), Some("No response from model"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_err() {
    let client = OpenAICompatibleClient::new(
        String::new(),
        "http://127.0.0.1:1".to_string(),
        "m".to_string(),
    )
    .unwrap();

    let result = client.complete("hello", &GenerationParams::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_openai_provider_builds_named_client() {
    let provider = Provider::OpenAI {
        api_key: "sk-test".to_string(),
        api_base: "https://api.openai.com/v1".to_string(),
        model: "gpt-4o-mini".to_string(),
    };
    let client = provider.create_client().unwrap();
    assert_eq!(client.model_name(), "gpt-4o-mini");
}

#[cfg(feature = "ollama")]
#[test]
fn test_ollama_provider_builds_client() {
    let provider = Provider::Ollama {
        base_url: "http://localhost:11434".to_string(),
        model: "ministral-3:3b".to_string(),
    };
    let client = provider.create_client().unwrap();
    assert_eq!(client.model_name(), "ministral-3:3b");
    assert_eq!(provider.name(), "Ollama");
}

#[tokio::test]
async fn test_scripted_provider_answers_every_prompt() {
    let client = Provider::Scripted {
        default_response: "offline answer".to_string(),
    }
    .create_client()
    .unwrap();

    for prompt in ["first", "second"] {
        let response = client.complete(prompt, &GenerationParams::default()).await.unwrap();
        assert_eq!(response.text, "offline answer");
    }
}
