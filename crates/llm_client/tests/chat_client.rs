//! Integration tests for ChatClient against a mock completion endpoint.

use chat_core::Message;
use llm_client::{ChatClient, ChatRequest, LlmError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(messages: Vec<Message>) -> ChatRequest {
    ChatRequest {
        model: "gpt-4o-mini".to_string(),
        messages,
        temperature: Some(0.7),
        max_tokens: Some(512),
    }
}

#[tokio::test]
async fn returns_trimmed_assistant_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "  Hello!  \n"},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new("test-key").with_base_url(server.uri());
    let reply = client
        .chat_completion(&request(vec![Message::user("hi")]))
        .await
        .unwrap();

    assert_eq!(reply, "Hello!");
}

#[tokio::test]
async fn non_success_status_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error": "invalid api key"}"#),
        )
        .mount(&server)
        .await;

    let client = ChatClient::new("bad-key").with_base_url(server.uri());
    let err = client
        .chat_completion(&request(vec![Message::user("hi")]))
        .await
        .unwrap_err();

    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status.as_u16(), 401);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_a_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": []
        })))
        .mount(&server)
        .await;

    let client = ChatClient::new("test-key").with_base_url(server.uri());
    let err = client
        .chat_completion(&request(vec![Message::user("hi")]))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::EmptyResponse));
}
