use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Role attached to one entry of a chat completion message list.
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Body of `POST /api/chat`.
pub struct ProxyChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Success body of `POST /api/chat`. `reply` is optional on the wire.
pub struct ProxyChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

impl ProxyChatReply {
    /// Returns the reply text when present and non-empty.
    pub fn into_reply_text(self) -> Option<String> {
        self.reply.filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Error)]
/// Failure kinds on either hop of the completion path.
pub enum CompletionError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Short stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::MissingApiKey => "missing_api_key",
            CompletionError::InvalidConfig(_) => "invalid_config",
            CompletionError::Transport(_) => "transport_failure",
            CompletionError::HttpStatus { .. } => "upstream_failure",
            CompletionError::MalformedResponse(_) => "malformed_response",
        }
    }
}

#[async_trait]
/// Anything that can turn a proxy chat request into reply text.
pub trait CompletionBackend: Send + Sync {
    async fn send(&self, request: &ProxyChatRequest) -> Result<String, CompletionError>;
}
