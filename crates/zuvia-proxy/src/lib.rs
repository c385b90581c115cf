//! Single-shot completion proxy between the chat widget and an OpenAI-compatible API.
//!
//! The widget posts `{ messages }` to `/api/chat`; the proxy adds the server-side
//! credential, model and sampling settings, and answers `{ reply }` or a JSON error.

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use zuvia_ai::{CompletionError, OpenAiChatClient, OpenAiChatConfig};
use zuvia_core::{current_unix_timestamp_ms, elapsed_ms_since};

const PROXY_SCHEMA_VERSION: u32 = 1;
pub const PROXY_CHAT_ENDPOINT: &str = "/api/chat";
pub const PROXY_HEALTH_ENDPOINT: &str = "/api/health";

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub bind: String,
    pub upstream_base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        let upstream = OpenAiChatConfig::default();
        Self {
            bind: "127.0.0.1:8787".to_string(),
            upstream_base_url: upstream.api_base,
            api_key: None,
            model: upstream.model,
            max_tokens: upstream.max_tokens,
            temperature: upstream.temperature,
            request_timeout_ms: upstream.request_timeout_ms,
        }
    }
}

/// Caller-facing failures, each with a fixed status and JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRejection {
    MethodNotAllowed,
    InvalidBody,
    MissingCredential,
    Upstream { detail: String },
    Internal,
}

impl ProxyRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyRejection::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyRejection::InvalidBody => StatusCode::BAD_REQUEST,
            ProxyRejection::MissingCredential | ProxyRejection::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyRejection::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> Value {
        match self {
            ProxyRejection::MethodNotAllowed => json!({ "error": "Only POST allowed" }),
            ProxyRejection::InvalidBody => {
                json!({ "error": "Invalid request, expected { messages: [...] }" })
            }
            ProxyRejection::MissingCredential => {
                json!({ "error": "OpenAI key not configured on server." })
            }
            ProxyRejection::Upstream { detail } => {
                json!({ "error": "OpenAI error", "detail": detail })
            }
            ProxyRejection::Internal => json!({ "error": "Server error" }),
        }
    }
}

impl IntoResponse for ProxyRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

struct ProxyState {
    upstream: Option<OpenAiChatClient>,
    upstream_chat_completions_url: String,
    model: String,
}

impl ProxyState {
    fn from_config(config: &ProxyConfig) -> Result<Self> {
        let upstream_config = OpenAiChatConfig {
            api_base: config.upstream_base_url.trim().to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_timeout_ms: config.request_timeout_ms.max(1_000),
        };

        let upstream = match OpenAiChatClient::new(upstream_config.clone()) {
            Ok(client) => Some(client),
            Err(CompletionError::MissingApiKey) => {
                tracing::warn!("OPENAI_API_KEY not set; /api/chat will answer 500");
                None
            }
            Err(error) => {
                return Err(error).context("failed to construct upstream chat client");
            }
        };

        let upstream_chat_completions_url = match upstream.as_ref() {
            Some(client) => client.chat_completions_url(),
            None => format!(
                "{}/chat/completions",
                upstream_config.api_base.trim_end_matches('/')
            ),
        };

        Ok(Self {
            upstream,
            upstream_chat_completions_url,
            model: upstream_config.model,
        })
    }
}

/// Run the completion proxy until ctrl-c.
pub async fn run_completion_proxy(config: ProxyConfig) -> Result<()> {
    let bind_addr: SocketAddr = config.bind.parse().with_context(|| {
        format!("invalid --bind '{}': expected host:port", config.bind)
    })?;
    let state = Arc::new(ProxyState::from_config(&config)?);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind completion proxy on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve completion proxy listen address")?;

    println!(
        "completion proxy listening: addr={} upstream={} model={} credential_configured={}",
        local_addr,
        state.upstream_chat_completions_url,
        state.model,
        state.upstream.is_some()
    );

    let app = build_proxy_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("completion proxy exited unexpectedly")?;
    Ok(())
}

/// Build the router for a config without binding a socket.
pub fn build_proxy_app(config: &ProxyConfig) -> Result<Router> {
    Ok(build_proxy_router(Arc::new(ProxyState::from_config(
        config,
    )?)))
}

fn build_proxy_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(PROXY_HEALTH_ENDPOINT, get(handle_health))
        .route(
            PROXY_CHAT_ENDPOINT,
            post(handle_chat).fallback(handle_method_not_allowed),
        )
        .with_state(state)
}

async fn handle_health(State(state): State<Arc<ProxyState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "schema_version": PROXY_SCHEMA_VERSION,
            "status": "ready",
            "model": state.model,
            "upstream_chat_completions_url": state.upstream_chat_completions_url,
            "credential_configured": state.upstream.is_some(),
        })),
    )
        .into_response()
}

async fn handle_method_not_allowed() -> ProxyRejection {
    ProxyRejection::MethodNotAllowed
}

/// Accepts `{ messages: [...] }` only; anything else is a 400.
pub fn parse_chat_messages(body: &[u8]) -> Result<Vec<Value>, ProxyRejection> {
    let parsed: Value = serde_json::from_slice(body).map_err(|_| ProxyRejection::InvalidBody)?;
    parsed
        .get("messages")
        .and_then(Value::as_array)
        .cloned()
        .ok_or(ProxyRejection::InvalidBody)
}

async fn handle_chat(State(state): State<Arc<ProxyState>>, body: Bytes) -> Response {
    match relay_chat(&state, &body).await {
        Ok(reply) => (StatusCode::OK, Json(json!({ "reply": reply }))).into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

async fn relay_chat(state: &ProxyState, body: &[u8]) -> Result<String, ProxyRejection> {
    let messages = parse_chat_messages(body)?;
    let Some(upstream) = state.upstream.as_ref() else {
        return Err(ProxyRejection::MissingCredential);
    };

    let started_unix_ms = current_unix_timestamp_ms();
    let outcome = upstream.complete(&messages).await;
    let duration_ms = elapsed_ms_since(started_unix_ms);

    match outcome {
        Ok(reply) => {
            tracing::debug!(
                messages = messages.len(),
                duration_ms,
                reply_chars = reply.chars().count(),
                "upstream completion succeeded"
            );
            Ok(reply)
        }
        Err(CompletionError::HttpStatus { status, body }) => {
            tracing::error!(status, duration_ms, body = body.as_str(), "upstream non-ok");
            Err(ProxyRejection::Upstream { detail: body })
        }
        Err(error) => {
            tracing::error!(
                error_kind = error.kind(),
                error = %error,
                duration_ms,
                "upstream request failed"
            );
            Err(ProxyRejection::Internal)
        }
    }
}
