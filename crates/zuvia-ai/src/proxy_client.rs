use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tokio::time::sleep;

use crate::{
    retry::{is_retryable_http_error, new_request_id, next_backoff_ms, should_retry_status},
    CompletionBackend, CompletionError, ProxyChatReply, ProxyChatRequest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Settings for the widget-side hop to the completion proxy.
pub struct ProxyClientConfig {
    pub endpoint: String,
    pub request_timeout_ms: u64,
    pub max_retries: usize,
}

impl Default for ProxyClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8787/api/chat".to_string(),
            request_timeout_ms: 15_000,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    config: ProxyClientConfig,
}

impl ProxyClient {
    pub fn new(config: ProxyClientConfig) -> Result<Self, CompletionError> {
        if config.endpoint.trim().is_empty() {
            return Err(CompletionError::InvalidConfig(
                "completion proxy endpoint cannot be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        self.config.endpoint.trim()
    }
}

#[async_trait]
impl CompletionBackend for ProxyClient {
    async fn send(&self, request: &ProxyChatRequest) -> Result<String, CompletionError> {
        let max_retries = self.config.max_retries;

        for attempt in 0..=max_retries {
            let request_id = new_request_id();
            tracing::debug!(
                endpoint = self.endpoint(),
                request_id = request_id.as_str(),
                attempt,
                messages = request.messages.len(),
                "sending completion request"
            );
            let response = self
                .client
                .post(self.endpoint())
                .header("x-zuvia-request-id", request_id)
                .json(request)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    let raw = response.text().await?;
                    if status.is_success() {
                        return parse_proxy_reply(&raw);
                    }

                    if attempt < max_retries && should_retry_status(status.as_u16()) {
                        sleep(std::time::Duration::from_millis(next_backoff_ms(attempt))).await;
                        continue;
                    }

                    return Err(CompletionError::HttpStatus {
                        status: status.as_u16(),
                        body: raw,
                    });
                }
                Err(error) => {
                    if attempt < max_retries && is_retryable_http_error(&error) {
                        sleep(std::time::Duration::from_millis(next_backoff_ms(attempt))).await;
                        continue;
                    }
                    return Err(CompletionError::Transport(error));
                }
            }
        }

        Err(CompletionError::MalformedResponse(
            "request retry loop terminated unexpectedly".to_string(),
        ))
    }
}

fn parse_proxy_reply(raw: &str) -> Result<String, CompletionError> {
    let parsed: ProxyChatReply = serde_json::from_str(raw).map_err(|error| {
        CompletionError::MalformedResponse(format!("failed to parse proxy response: {error}"))
    })?;
    parsed.into_reply_text().ok_or_else(|| {
        CompletionError::MalformedResponse("proxy response carried no reply text".to_string())
    })
}
