//! OpenAI-compatible AI relay client.
//!
//! Thin pass-through over reqwest: chat completions (plain and streaming),
//! model listing, image generation. The egress policy is re-validated
//! before every request - never only at construction - so a DNS rebinding
//! between calls is caught.

use futures::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::security::{EgressPolicy, SecurityError, redact};

use super::sse::{SseEvent, SseParser};
use super::types::{
    ChatRequest, ChatResponse, ImageRequest, ImageResponse, ModelsResponse, StreamChunk,
};

/// Default cap on upstream response size: 50 MB.
const MAX_RESPONSE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum AiClientError {
    #[error(transparent)]
    Blocked(#[from] SecurityError),

    #[error("upstream API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response too large")]
    ResponseTooLarge,
}

fn transport_error(err: &reqwest::Error) -> AiClientError {
    if err.is_timeout() {
        AiClientError::Timeout
    } else {
        AiClientError::Network(redact(&err.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    policy: EgressPolicy,
    max_response_bytes: usize,
}

impl AiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        policy: EgressPolicy,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            policy,
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, AiClientError> {
        // Fresh gate pass per request, resolution included.
        self.policy.validate(&self.base_url).await?;

        let response = request
            .bearer_auth(&self.api_key)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AiClientError::RateLimited);
        }
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "upstream error: {}", redact(&body));
            return Err(AiClientError::Upstream {
                status: status.as_u16(),
                body: redact(&body),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AiClientError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.send(self.http.get(&url)).await?;
        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, AiClientError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.send(self.http.post(&url).json(body)).await?;
        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Non-streaming chat completion.
    ///
    /// # Errors
    ///
    /// [`AiClientError`] for gate rejection, transport failures, and
    /// upstream error statuses.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AiClientError> {
        let mut request = request.clone();
        request.stream = false;
        self.post_json("/v1/chat/completions", &request).await
    }

    /// Streaming chat completion.
    ///
    /// Returns a channel of parsed chunks. Malformed SSE data lines are
    /// skipped; the channel closes on `[DONE]`, end of body, transport
    /// error, or when the cumulative body exceeds the response cap.
    ///
    /// # Errors
    ///
    /// Same as [`Self::chat`] for everything up to the first byte of body.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, AiClientError>>, AiClientError> {
        let mut request = request.clone();
        request.stream = true;

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self.send(self.http.post(&url).json(&request)).await?;

        let (tx, rx) = mpsc::channel(32);
        let limit = self.max_response_bytes;

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = SseParser::new();
            let mut received = 0usize;

            while let Some(item) = body.next().await {
                let bytes = match item {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        let _ = tx.send(Err(transport_error(&err))).await;
                        return;
                    }
                };

                received += bytes.len();
                if received > limit {
                    let _ = tx.send(Err(AiClientError::ResponseTooLarge)).await;
                    return;
                }

                for event in parser.push(&String::from_utf8_lossy(&bytes)) {
                    match event {
                        SseEvent::Done => return,
                        SseEvent::Data(data) => {
                            // a malformed line is the upstream's problem, not a stream abort
                            if let Ok(chunk) = serde_json::from_str::<StreamChunk>(&data) {
                                if tx.send(Ok(chunk)).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    /// List available models.
    ///
    /// # Errors
    ///
    /// See [`Self::chat`].
    pub async fn list_models(&self) -> Result<ModelsResponse, AiClientError> {
        self.get_json("/v1/models").await
    }

    /// Generate images.
    ///
    /// # Errors
    ///
    /// See [`Self::chat`].
    pub async fn generate_image(
        &self,
        request: &ImageRequest,
    ) -> Result<ImageResponse, AiClientError> {
        self.post_json("/v1/images/generations", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::types::ChatMessage;
    use serde_json::json;

    fn localhost_policy() -> EgressPolicy {
        EgressPolicy::new(Vec::new(), true)
    }

    fn chat_request() -> ChatRequest {
        ChatRequest::new("test-model", vec![ChatMessage::new("user", "hello")])
    }

    #[tokio::test]
    async fn chat_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                json!({
                    "id": "cmpl-1",
                    "object": "chat.completion",
                    "created": 1,
                    "model": "test-model",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "hi there"},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = AiClient::new(
            reqwest::Client::new(),
            server.url(),
            "test-key",
            localhost_policy(),
        );
        let response = client.chat(&chat_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            response.choices[0].message.as_ref().unwrap().content,
            "hi there"
        );
        assert_eq!(response.usage.unwrap().total_tokens, 3);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_typed_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .create_async()
            .await;

        let client = AiClient::new(
            reqwest::Client::new(),
            server.url(),
            "k",
            localhost_policy(),
        );
        let err = client.chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, AiClientError::RateLimited));
    }

    #[tokio::test]
    async fn upstream_error_is_surfaced_and_redacted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("boom: sk-abcdefghij1234567890abcd leaked")
            .create_async()
            .await;

        let client = AiClient::new(
            reqwest::Client::new(),
            server.url(),
            "k",
            localhost_policy(),
        );
        match client.chat(&chat_request()).await.unwrap_err() {
            AiClientError::Upstream { status, body } => {
                assert_eq!(status, 500);
                assert!(!body.contains("sk-abcdefghij1234567890abcd"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn gate_blocks_before_any_request() {
        // localhost not allowed: mockito would be unreachable anyway
        let client = AiClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            "k",
            EgressPolicy::new(Vec::new(), false),
        );
        let err = client.chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, AiClientError::Blocked(_)));
    }

    #[tokio::test]
    async fn list_models_round_trip() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_body(
                json!({"object": "list", "data": [{"id": "m-1"}, {"id": "m-2"}]}).to_string(),
            )
            .create_async()
            .await;

        let client = AiClient::new(
            reqwest::Client::new(),
            server.url(),
            "k",
            localhost_policy(),
        );
        let models = client.list_models().await.unwrap();
        assert_eq!(models.data.len(), 2);
        assert_eq!(models.data[0].id, "m-1");
    }

    #[tokio::test]
    async fn chat_stream_parses_chunks_until_done() {
        let body = concat!(
            "data: {\"id\":\"c\",\"choices\":[{\"delta\":{\"content\":\"he\"}}]}\n\n",
            "data: {\"id\":\"c\",\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n",
            "data: not json, skipped\n\n",
            "data: [DONE]\n\n",
            "data: {\"id\":\"after-done-ignored\"}\n\n",
        );

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let client = AiClient::new(
            reqwest::Client::new(),
            server.url(),
            "k",
            localhost_policy(),
        );
        let mut rx = client.chat_stream(&chat_request()).await.unwrap();

        let mut content = String::new();
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk.unwrap();
            if let Some(delta) = chunk.choices.first().and_then(|c| c.delta.as_ref()) {
                if let Some(text) = &delta.content {
                    content.push_str(text);
                }
            }
        }
        assert_eq!(content, "hello");
    }

    #[tokio::test]
    async fn oversized_stream_is_cut() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("data: {\"id\":\"x\"}\n\n".repeat(64))
            .create_async()
            .await;

        let client = AiClient::new(
            reqwest::Client::new(),
            server.url(),
            "k",
            localhost_policy(),
        )
        .with_max_response_bytes(16);

        let mut rx = client.chat_stream(&chat_request()).await.unwrap();
        let mut saw_too_large = false;
        while let Some(item) = rx.recv().await {
            if matches!(item, Err(AiClientError::ResponseTooLarge)) {
                saw_too_large = true;
            }
        }
        assert!(saw_too_large);
    }
}
