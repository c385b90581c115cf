//! Chat wire types and HTTP clients for the Zuvia completion path.
//!
//! `ProxyClient` is the widget-side hop (widget -> `/api/chat`), `OpenAiChatClient`
//! is the proxy-side hop (proxy -> provider chat completions).
mod openai;
mod proxy_client;
mod retry;
mod types;

pub use openai::{OpenAiChatClient, OpenAiChatConfig};
pub use proxy_client::{ProxyClient, ProxyClientConfig};
pub use retry::{new_request_id, next_backoff_ms, should_retry_status};
pub use types::{
    ChatMessage, ChatRole, CompletionBackend, CompletionError, ProxyChatReply, ProxyChatRequest,
};
