//! Simplifique.ai (Stammer) chatbot message API client.
//!
//! One POST per request:
//!
//! ```text
//! POST /pt/chatbot/api/v1/message/
//! Authorization: Token <api_token>
//! {"chatbot_uuid": "...", "user_key": "...", "query": "...",
//!  "custom_base_system_prompt": "...", "recipent_url": "..."}
//! ```
//!
//! 5xx answers and connection failures are retried with exponential backoff.
//! A 5xx that outlasts the retries is a transport failure, not a vendor reply.

use std::time::Duration;

use async_trait::async_trait;
use chatbridge_config::UpstreamConfig;
use chatbridge_core::error::UpstreamError;
use chatbridge_core::upstream::{Upstream, UpstreamReply, UpstreamRequest};
use serde_json::Value;
use tracing::{debug, warn};

/// Statuses worth another attempt.
const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Statuses the vendor uses for a successful answer.
const ACCEPTED_STATUSES: [u16; 3] = [200, 201, 202];

/// Client for the Simplifique.ai message endpoint.
pub struct SimplifiqueClient {
    api_url: String,
    max_retries: u32,
    backoff_factor: f64,
    fallback_answer: String,
    client: reqwest::Client,
}

impl SimplifiqueClient {
    /// Build a client from the `[upstream]` config table.
    ///
    /// `fallback_answer` is returned when a successful reply carries no text.
    pub fn new(
        config: &UpstreamConfig,
        fallback_answer: impl Into<String>,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_url: config.api_url.clone(),
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
            fallback_answer: fallback_answer.into(),
            client,
        })
    }

    /// Delay before the given retry (1-based).
    fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16) as i32;
        Duration::try_from_secs_f64(self.backoff_factor * 2f64.powi(exponent)).unwrap_or_default()
    }

    async fn post_with_retry(
        &self,
        request: &UpstreamRequest,
    ) -> Result<reqwest::Response, UpstreamError> {
        let mut retry = 0;
        loop {
            let result = self
                .client
                .post(&self.api_url)
                .header("Authorization", format!("Token {}", request.api_token))
                .json(request)
                .send()
                .await;

            match result {
                Ok(response) if RETRY_STATUSES.contains(&response.status().as_u16()) => {
                    let status = response.status().as_u16();
                    if retry >= self.max_retries {
                        return Err(UpstreamError::Network(format!(
                            "upstream still answered {status} after {retry} retries"
                        )));
                    }
                    warn!(status, retry, "Upstream returned a retryable status");
                }
                Ok(response) => return Ok(response),
                Err(e) if retry < self.max_retries && (e.is_connect() || e.is_timeout()) => {
                    warn!(error = %e, retry, "Upstream connection failed, retrying");
                }
                Err(e) if e.is_timeout() => return Err(UpstreamError::Timeout(e.to_string())),
                Err(e) => return Err(UpstreamError::Network(e.to_string())),
            }

            retry += 1;
            tokio::time::sleep(self.backoff(retry)).await;
        }
    }
}

#[async_trait]
impl Upstream for SimplifiqueClient {
    fn name(&self) -> &str {
        "simplifique"
    }

    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamReply, UpstreamError> {
        debug!(
            chatbot = %request.chatbot_uuid,
            user_key = %request.user_key,
            query_len = request.query.len(),
            "Sending message upstream"
        );

        let response = self.post_with_retry(&request).await?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        debug!(status, body = %text, "Upstream response");

        let body: Value = serde_json::from_str(&text).map_err(|_| {
            warn!(status, body = %text, "Upstream returned a non-JSON body");
            UpstreamError::InvalidResponse(text.clone())
        })?;

        if !ACCEPTED_STATUSES.contains(&status) {
            let detail = error_detail(&body);
            warn!(status, detail = %detail, "Upstream rejected the request");
            return Err(UpstreamError::Status { status, detail });
        }

        Ok(UpstreamReply {
            status,
            answer: extract_answer(&body).unwrap_or_else(|| self.fallback_answer.clone()),
        })
    }
}

/// The answer text from a successful reply: `data.answer`, then `response`,
/// then `message`. Empty values are skipped.
pub fn extract_answer(body: &Value) -> Option<String> {
    [
        body.pointer("/data/answer"),
        body.get("response"),
        body.get("message"),
    ]
    .into_iter()
    .flatten()
    .find(|v| is_present(v))
    .map(value_text)
}

/// A human-readable reason from an error reply: `message`, then `error`,
/// then the whole body.
pub fn error_detail(body: &Value) -> String {
    ["message", "error"]
        .into_iter()
        .filter_map(|key| body.get(key))
        .find(|v| is_present(v))
        .map(value_text)
        .unwrap_or_else(|| body.to_string())
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
