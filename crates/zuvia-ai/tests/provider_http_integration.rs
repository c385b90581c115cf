use httpmock::prelude::*;
use serde_json::json;
use zuvia_ai::{
    ChatMessage, CompletionBackend, CompletionError, OpenAiChatClient, OpenAiChatConfig,
    ProxyChatRequest, ProxyClient, ProxyClientConfig,
};

fn sample_request() -> ProxyChatRequest {
    ProxyChatRequest {
        messages: vec![
            ChatMessage::system("You are Zuvia assistant."),
            ChatMessage::user("Do you deliver 20 L jars?"),
        ],
    }
}

#[tokio::test]
async fn proxy_client_posts_messages_and_returns_reply() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/chat")
            .header("content-type", "application/json")
            .header_exists("x-zuvia-request-id")
            .json_body_includes(
                json!({
                    "messages": [
                        {"role": "system", "content": "You are Zuvia assistant."},
                        {"role": "user", "content": "Do you deliver 20 L jars?"}
                    ]
                })
                .to_string(),
            );
        then.status(200)
            .json_body(json!({ "reply": "Yes, across the city." }));
    });

    let client = ProxyClient::new(ProxyClientConfig {
        endpoint: format!("{}/api/chat", server.base_url()),
        request_timeout_ms: 5_000,
        max_retries: 0,
    })
    .expect("proxy client should be created");

    let reply = client
        .send(&sample_request())
        .await
        .expect("completion should succeed");

    mock.assert();
    assert_eq!(reply, "Yes, across the city.");
}

#[tokio::test]
async fn proxy_client_reports_http_status_without_retry_by_default() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/chat");
        then.status(502)
            .json_body(json!({ "error": "OpenAI error", "detail": "overloaded" }));
    });

    let client = ProxyClient::new(ProxyClientConfig {
        endpoint: format!("{}/api/chat", server.base_url()),
        request_timeout_ms: 5_000,
        max_retries: 0,
    })
    .expect("proxy client should be created");

    let error = client
        .send(&sample_request())
        .await
        .expect_err("502 must fail");

    mock.assert_hits(1);
    match error {
        CompletionError::HttpStatus { status, body } => {
            assert_eq!(status, 502);
            assert!(body.contains("overloaded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn proxy_client_retries_retryable_status_when_configured() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/chat");
        then.status(503).body("busy");
    });

    let client = ProxyClient::new(ProxyClientConfig {
        endpoint: format!("{}/api/chat", server.base_url()),
        request_timeout_ms: 5_000,
        max_retries: 2,
    })
    .expect("proxy client should be created");

    let error = client
        .send(&sample_request())
        .await
        .expect_err("503 must fail after retries");

    mock.assert_hits(3);
    assert_eq!(error.kind(), "upstream_failure");
}

#[tokio::test]
async fn proxy_client_treats_success_without_reply_as_malformed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/chat");
        then.status(200).json_body(json!({ "status": "ok" }));
    });

    let client = ProxyClient::new(ProxyClientConfig {
        endpoint: format!("{}/api/chat", server.base_url()),
        ..ProxyClientConfig::default()
    })
    .expect("proxy client should be created");

    let error = client
        .send(&sample_request())
        .await
        .expect_err("missing reply must fail");
    assert_eq!(error.kind(), "malformed_response");
}

#[tokio::test]
async fn proxy_client_reports_transport_failure_for_unreachable_endpoint() {
    let client = ProxyClient::new(ProxyClientConfig {
        endpoint: "http://127.0.0.1:9/api/chat".to_string(),
        request_timeout_ms: 2_000,
        max_retries: 0,
    })
    .expect("proxy client should be created");

    let error = client
        .send(&sample_request())
        .await
        .expect_err("closed port must fail");
    assert_eq!(error.kind(), "transport_failure");
}

#[tokio::test]
async fn openai_client_sends_fixed_model_budget_and_bearer() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer test-openai-key")
            .json_body_includes(
                json!({
                    "model": "gpt-3.5-turbo",
                    "max_tokens": 800,
                    "messages": [{"role": "user", "content": "hello"}]
                })
                .to_string(),
            );
        then.status(200).json_body(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Hello from Zuvia" },
                "finish_reason": "stop"
            }]
        }));
    });

    let client = OpenAiChatClient::new(OpenAiChatConfig {
        api_base: format!("{}/v1", server.base_url()),
        api_key: "test-openai-key".to_string(),
        ..OpenAiChatConfig::default()
    })
    .expect("openai client should be created");

    let reply = client
        .complete(&[json!({"role": "user", "content": "hello"})])
        .await
        .expect("completion should succeed");

    mock.assert();
    assert_eq!(reply, "Hello from Zuvia");
}

#[tokio::test]
async fn openai_client_surfaces_upstream_error_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(401)
            .body(r#"{"error":{"message":"Incorrect API key provided"}}"#);
    });

    let client = OpenAiChatClient::new(OpenAiChatConfig {
        api_base: format!("{}/v1", server.base_url()),
        api_key: "bad-key".to_string(),
        ..OpenAiChatConfig::default()
    })
    .expect("openai client should be created");

    let error = client
        .complete(&[json!({"role": "user", "content": "hello"})])
        .await
        .expect_err("401 must fail");
    match error {
        CompletionError::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
