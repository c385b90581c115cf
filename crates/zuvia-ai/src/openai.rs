use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CompletionError;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiChatConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_ms: u64,
}

impl Default for OpenAiChatConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 800,
            temperature: 0.2,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [Value],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone)]
/// Single-shot chat completion client used by the proxy.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    config: OpenAiChatConfig,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiChatConfig) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|e| {
                CompletionError::InvalidConfig(format!("invalid API key header: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn chat_completions_url(&self) -> String {
        chat_completions_url(&self.config.api_base)
    }

    /// Forwards `messages` untouched and returns the first choice's text, which is
    /// empty when the provider omits it.
    pub async fn complete(&self, messages: &[Value]) -> Result<String, CompletionError> {
        let body = OpenAiChatRequestBody {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.chat_completions_url())
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(CompletionError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        parse_chat_completion(&raw)
    }
}

pub(crate) fn chat_completions_url(api_base: &str) -> String {
    let base = api_base.trim().trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        return base.to_string();
    }

    format!("{base}/chat/completions")
}

fn parse_chat_completion(raw: &str) -> Result<String, CompletionError> {
    let parsed: OpenAiChatResponse = serde_json::from_str(raw).map_err(|error| {
        CompletionError::MalformedResponse(format!("failed to parse provider response: {error}"))
    })?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .map(|message| extract_text(&message.content))
        .unwrap_or_default())
}

fn extract_text(content: &Option<Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.as_object())
            .filter(|obj| obj.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|obj| obj.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<Value>,
}
