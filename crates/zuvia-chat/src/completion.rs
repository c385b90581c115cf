use std::sync::Arc;

use zuvia_ai::{ChatMessage, CompletionBackend, ProxyChatRequest};

use crate::transcript::{Speaker, TranscriptStore};

pub const DEFAULT_SYSTEM_DIRECTIVE: &str = "You are Zuvia assistant. Be helpful, friendly and concise. Answer user queries about products, orders, distributorship and contact details. If user asks for numbers or addresses, repeat exactly as given.";
pub const DEFAULT_CONTEXT_WINDOW: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of one remote completion attempt, as seen by the orchestrator.
pub enum CompletionResult {
    Reply(String),
    Unavailable,
}

#[derive(Clone)]
/// Builds windowed requests and collapses every failure into `Unavailable`.
pub struct CompletionClient {
    backend: Option<Arc<dyn CompletionBackend>>,
    system_directive: String,
    context_window: usize,
}

impl CompletionClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        system_directive: impl Into<String>,
        context_window: usize,
    ) -> Self {
        Self {
            backend: Some(backend),
            system_directive: system_directive.into(),
            context_window,
        }
    }

    /// A client with no proxy configured; every call is `Unavailable`.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            system_directive: DEFAULT_SYSTEM_DIRECTIVE.to_string(),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// System directive, then the trailing window of `transcript`, then `new_text`.
    ///
    /// The window is taken after the new user turn was appended, so that turn is sent
    /// both as the newest history entry and as the final message.
    pub fn build_request(&self, new_text: &str, transcript: &TranscriptStore) -> ProxyChatRequest {
        let window = transcript.window(self.context_window);
        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(ChatMessage::system(self.system_directive.as_str()));
        messages.extend(window.iter().map(|turn| match turn.speaker() {
            Speaker::User => ChatMessage::user(turn.text()),
            Speaker::Bot => ChatMessage::assistant(turn.text()),
        }));
        messages.push(ChatMessage::user(new_text));
        ProxyChatRequest { messages }
    }

    pub async fn complete(
        &self,
        new_text: &str,
        transcript: &TranscriptStore,
    ) -> CompletionResult {
        let Some(backend) = self.backend.as_ref() else {
            tracing::debug!("completion proxy not configured; skipping remote reply");
            return CompletionResult::Unavailable;
        };

        let request = self.build_request(new_text, transcript);
        match backend.send(&request).await {
            Ok(reply) if !reply.is_empty() => CompletionResult::Reply(reply),
            Ok(_) => {
                tracing::warn!(
                    error_kind = "malformed_response",
                    "completion proxy returned an empty reply"
                );
                CompletionResult::Unavailable
            }
            Err(error) => {
                tracing::warn!(
                    error_kind = error.kind(),
                    error = %error,
                    "completion proxy unavailable; falling back to canned replies"
                );
                CompletionResult::Unavailable
            }
        }
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("enabled", &self.is_enabled())
            .field("context_window", &self.context_window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex as AsyncMutex;
    use zuvia_ai::{ChatRole, CompletionBackend, CompletionError, ProxyChatRequest};

    use super::{CompletionClient, CompletionResult, DEFAULT_CONTEXT_WINDOW};
    use crate::transcript::{TranscriptStore, Turn};

    struct ScriptedBackend {
        responses: AsyncMutex<VecDeque<Result<String, CompletionError>>>,
        requests: AsyncMutex<Vec<ProxyChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                responses: AsyncMutex::new(VecDeque::from(responses)),
                requests: AsyncMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn send(&self, request: &ProxyChatRequest) -> Result<String, CompletionError> {
            self.requests.lock().await.push(request.clone());
            self.responses.lock().await.pop_front().unwrap_or_else(|| {
                Err(CompletionError::MalformedResponse(
                    "scripted response queue exhausted".to_string(),
                ))
            })
        }
    }

    fn history(count: usize) -> TranscriptStore {
        let mut transcript = TranscriptStore::new();
        for index in 0..count {
            if index % 2 == 0 {
                transcript.append(Turn::user(format!("question {index}")));
            } else {
                transcript.append(Turn::bot(format!("answer {index}")));
            }
        }
        transcript
    }

    fn client_with(backend: Arc<ScriptedBackend>) -> CompletionClient {
        CompletionClient::new(backend, "system directive", DEFAULT_CONTEXT_WINDOW)
    }

    #[test]
    fn unit_build_request_windows_thirty_turns_to_eighteen_messages() {
        let client = client_with(Arc::new(ScriptedBackend::new(Vec::new())));
        let request = client.build_request("new question", &history(30));

        assert_eq!(request.messages.len(), 18);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[0].content, "system directive");
        assert_eq!(request.messages[1].content, "question 14");
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert_eq!(request.messages[16].content, "answer 29");
        assert_eq!(request.messages[16].role, ChatRole::Assistant);
        assert_eq!(request.messages[17].role, ChatRole::User);
        assert_eq!(request.messages[17].content, "new question");
    }

    #[test]
    fn unit_build_request_with_empty_history_has_system_and_user_only() {
        let client = client_with(Arc::new(ScriptedBackend::new(Vec::new())));
        let request = client.build_request("hi", &TranscriptStore::new());
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn unit_build_request_repeats_the_appended_user_turn() {
        let client = client_with(Arc::new(ScriptedBackend::new(Vec::new())));
        let mut transcript = history(1);
        transcript.append(Turn::user("new question"));

        let request = client.build_request("new question", &transcript);

        let contents: Vec<&str> = request
            .messages
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["system directive", "question 0", "new question", "new question"]
        );
        assert_eq!(request.messages[2].role, ChatRole::User);
    }

    #[tokio::test]
    async fn functional_reply_passes_through() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("We ship daily.".to_string())]));
        let client = client_with(backend.clone());

        let result = client.complete("delivery?", &history(2)).await;
        assert_eq!(result, CompletionResult::Reply("We ship daily.".to_string()));
        assert_eq!(backend.requests.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn regression_every_failure_kind_collapses_to_unavailable() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(CompletionError::HttpStatus {
                status: 502,
                body: "{\"error\":\"OpenAI error\"}".to_string(),
            }),
            Err(CompletionError::MalformedResponse("no reply".to_string())),
            Err(CompletionError::MissingApiKey),
            Ok(String::new()),
        ]));
        let client = client_with(backend);

        for _ in 0..4 {
            assert_eq!(
                client.complete("hello", &TranscriptStore::new()).await,
                CompletionResult::Unavailable
            );
        }
    }

    #[tokio::test]
    async fn regression_whitespace_reply_is_still_a_reply() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok("  ".to_string())]));
        let client = client_with(backend);

        assert_eq!(
            client.complete("hello", &TranscriptStore::new()).await,
            CompletionResult::Reply("  ".to_string())
        );
    }

    #[tokio::test]
    async fn regression_disabled_client_never_calls_out() {
        let client = CompletionClient::disabled();
        assert!(!client.is_enabled());
        assert_eq!(
            client.complete("hello", &history(4)).await,
            CompletionResult::Unavailable
        );
    }
}
