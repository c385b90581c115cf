use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use zuvia_ai::{CompletionBackend, ProxyClient, ProxyClientConfig};
use zuvia_chat::{
    CannedCategory, ConversationSession, FileKeyValueStore, KeyValueStore, ReplySource, Speaker,
    WidgetConfig, DEFAULT_ESCALATION_MESSAGE, DEFAULT_STORAGE_KEY, DEFAULT_SYSTEM_DIRECTIVE,
};
use zuvia_proxy::{build_proxy_app, ProxyConfig, PROXY_CHAT_ENDPOINT};

async fn spawn_proxy(config: ProxyConfig) -> String {
    let app = build_proxy_app(&config).expect("build proxy app");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind proxy listener");
    let addr = listener.local_addr().expect("proxy addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve proxy");
    });
    format!("http://{addr}{PROXY_CHAT_ENDPOINT}")
}

fn proxy_config(upstream_base_url: String, api_key: Option<&str>) -> ProxyConfig {
    ProxyConfig {
        bind: "127.0.0.1:0".to_string(),
        upstream_base_url,
        api_key: api_key.map(str::to_string),
        request_timeout_ms: 5_000,
        ..ProxyConfig::default()
    }
}

fn widget_session(endpoint: &str, state_dir: &std::path::Path) -> ConversationSession {
    let backend = ProxyClient::new(ProxyClientConfig {
        endpoint: endpoint.to_string(),
        request_timeout_ms: 5_000,
        max_retries: 0,
    })
    .expect("proxy client");
    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(state_dir));
    ConversationSession::new(
        WidgetConfig::default(),
        Some(Arc::new(backend) as Arc<dyn CompletionBackend>),
        store,
    )
}

#[tokio::test]
async fn integration_reply_travels_from_provider_through_proxy_into_transcript() {
    let provider = MockServer::start_async().await;
    let completion = provider.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer provider-key")
            .json_body_includes(
                json!({
                    "model": "gpt-3.5-turbo",
                    "max_tokens": 800
                })
                .to_string(),
            )
            .body_includes(DEFAULT_SYSTEM_DIRECTIVE)
            .body_includes("need 20 L jars weekly");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "We supply 20 L jars weekly."}}]
            }));
    });
    let endpoint = spawn_proxy(proxy_config(
        format!("{}/v1", provider.base_url()),
        Some("provider-key"),
    ))
    .await;

    let state_dir = tempfile::tempdir().expect("tempdir");
    let mut session = widget_session(&endpoint, state_dir.path());
    let source = session.handle_user_input("need 20 L jars weekly").await;

    completion.assert_async().await;
    assert_eq!(source, Some(ReplySource::Remote));
    let last = session.transcript().last().expect("bot turn");
    assert_eq!(last.speaker(), Speaker::Bot);
    assert_eq!(last.text(), "We supply 20 L jars weekly.");

    let raw = std::fs::read_to_string(
        state_dir
            .path()
            .join(format!("{DEFAULT_STORAGE_KEY}.json")),
    )
    .expect("stored conversation");
    let stored: Value = serde_json::from_str(&raw).expect("stored json");
    assert_eq!(
        stored,
        json!([
            {"who": "user", "text": "need 20 L jars weekly"},
            {"who": "bot", "text": "We supply 20 L jars weekly."}
        ])
    );

    let mut revisit = widget_session(&endpoint, state_dir.path());
    revisit.boot();
    assert_eq!(revisit.transcript().all(), session.transcript().all());
}

#[tokio::test]
async fn integration_proxy_without_credential_leaves_widget_on_scripted_replies() {
    let endpoint = spawn_proxy(proxy_config("http://127.0.0.1:9/v1".to_string(), None)).await;
    let state_dir = tempfile::tempdir().expect("tempdir");
    let mut session = widget_session(&endpoint, state_dir.path());

    let source = session.handle_user_input("what does a 1.5 L pack cost").await;

    assert_eq!(source, Some(ReplySource::Canned(CannedCategory::Pricing)));
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn integration_provider_rejection_is_absorbed_by_the_widget() {
    let provider = MockServer::start_async().await;
    let completion = provider.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(401)
            .body(r#"{"error":{"message":"Incorrect API key provided"}}"#);
    });
    let endpoint = spawn_proxy(proxy_config(
        format!("{}/v1", provider.base_url()),
        Some("revoked-key"),
    ))
    .await;

    let state_dir = tempfile::tempdir().expect("tempdir");
    let mut session = widget_session(&endpoint, state_dir.path());
    let source = session.handle_user_input("what is the weather").await;

    completion.assert_async().await;
    assert_eq!(source, Some(ReplySource::Escalation));
    assert_eq!(
        session.transcript().last().map(|turn| turn.text().to_string()),
        Some(DEFAULT_ESCALATION_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn regression_unreachable_proxy_falls_back_without_losing_the_user_turn() {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let mut session = widget_session("http://127.0.0.1:9/api/chat", state_dir.path());

    let source = session.handle_user_input("Namaste").await;

    assert_eq!(source, Some(ReplySource::Canned(CannedCategory::Greeting)));
    let speakers: Vec<Speaker> = session
        .transcript()
        .all()
        .iter()
        .map(|turn| turn.speaker())
        .collect();
    assert_eq!(speakers, vec![Speaker::User, Speaker::Bot]);
}
