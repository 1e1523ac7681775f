//! Integration tests for the OpenAI-compatible adapter against a local mock
//! server, in place of a live provider.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskflow_core::error::GatewayError;
use taskflow_core::gateway::providers::{OpenAiCompatibleAdapter, Pricing};
use taskflow_core::gateway::{Adapter, ChatMessage, CompletionRequest};

fn pricing() -> Pricing {
    Pricing { prompt_per_1k: 0.01, completion_per_1k: 0.03 }
}

#[tokio::test]
async fn complete_parses_a_successful_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "hello there"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        })))
        .mount(&mock_server)
        .await;

    let adapter = OpenAiCompatibleAdapter::new(
        "openai",
        mock_server.uri(),
        "sk-test",
        "gpt-test",
        pricing(),
        reqwest::Client::new(),
    );

    let request = CompletionRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
    let result = adapter.complete(&request).await.unwrap();

    assert_eq!(result.content, "hello there");
    assert_eq!(result.finish_reason.as_deref(), Some("stop"));
    assert_eq!(result.usage.unwrap().total_tokens, 7);
}

#[tokio::test]
async fn complete_maps_401_to_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let adapter = OpenAiCompatibleAdapter::new(
        "openai",
        mock_server.uri(),
        "sk-bad",
        "gpt-test",
        pricing(),
        reqwest::Client::new(),
    );

    let request = CompletionRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
    let err = adapter.complete(&request).await.unwrap_err();
    assert!(matches!(err, GatewayError::Auth { .. }));
}

#[tokio::test]
async fn complete_maps_429_to_rate_limit_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let adapter = OpenAiCompatibleAdapter::new(
        "openai",
        mock_server.uri(),
        "sk-test",
        "gpt-test",
        pricing(),
        reqwest::Client::new(),
    );

    let request = CompletionRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
    let err = adapter.complete(&request).await.unwrap_err();
    assert!(matches!(err, GatewayError::RateLimit { .. }));
}

#[tokio::test]
async fn stream_yields_deltas_reconstructing_the_full_message() {
    use futures::StreamExt;

    let mock_server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"hel\"},\"finish_reason\":null}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"\"},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/event-stream"),
        )
        .mount(&mock_server)
        .await;

    let adapter = OpenAiCompatibleAdapter::new(
        "openai",
        mock_server.uri(),
        "sk-test",
        "gpt-test",
        pricing(),
        reqwest::Client::new(),
    );

    let request = CompletionRequest::new("gpt-test", vec![ChatMessage::user("hi")]);
    let mut stream = adapter.stream(&request).await.unwrap();

    let mut content = String::new();
    let mut saw_stop = false;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        content.push_str(&chunk.delta);
        if chunk.finish_reason.is_some() {
            saw_stop = true;
        }
    }

    assert_eq!(content, "hello");
    assert!(saw_stop);
}
