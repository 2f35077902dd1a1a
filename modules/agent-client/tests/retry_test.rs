use std::sync::Arc;
use std::time::Duration;

use agent_client::{AccessToken, FoundryClient, ResponseRequest, TokenProvider};
use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticToken;

#[async_trait]
impl TokenProvider for StaticToken {
    async fn fetch(&self) -> Result<AccessToken, agent_client::AgentClientError> {
        Ok(AccessToken::static_token("test-token"))
    }
}

fn client(server: &MockServer) -> FoundryClient {
    FoundryClient::new(
        server.uri(),
        "2025-11-15-preview",
        Duration::from_secs(10),
        Arc::new(StaticToken),
    )
    .unwrap()
}

#[tokio::test]
async fn retries_on_500_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/responses"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/openai/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "output_text": "hello"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let request = ResponseRequest {
        model: "gpt".to_string(),
        assistant_id: None,
        input: vec![],
        tools: vec![],
        text: None,
    };

    let envelope = client.create_response(&request).await.unwrap();
    assert_eq!(envelope.output_text.as_deref(), Some("hello"));
}

#[tokio::test]
async fn does_not_retry_on_400() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/responses"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let request = ResponseRequest {
        model: "gpt".to_string(),
        assistant_id: None,
        input: vec![],
        tools: vec![],
        text: None,
    };

    let err = client.create_response(&request).await.unwrap_err();
    match err {
        agent_client::AgentClientError::Api { status, .. } => assert_eq!(status, 400),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn honors_retry_after_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/openai/assistants"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/openai/assistants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": "a1", "name": "planner"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let started = tokio::time::Instant::now();
    let agents = client.list_agents_by_name().await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert_eq!(agents.get("planner"), Some(&"a1".to_string()));
}

#[tokio::test]
async fn tolerates_bare_array_agent_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/openai/assistants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "a1", "name": "Planner"}
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    let agents = client.list_agents_by_name().await.unwrap();
    assert_eq!(agents.get("planner"), Some(&"a1".to_string()));
}
