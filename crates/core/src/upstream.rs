//! Upstream trait — the abstraction over the chatbot vendor API.
//!
//! The gateway builds an [`UpstreamRequest`] from the OpenAI-style payload
//! and hands it to whatever `Upstream` is configured. Tests plug in a mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// A single message destined for the upstream chatbot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    /// Which chatbot should answer
    pub chatbot_uuid: String,

    /// Conversation key on the upstream side
    pub user_key: String,

    /// The text the chatbot answers
    pub query: String,

    /// Replaces the chatbot's base system prompt for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_base_system_prompt: Option<String>,

    /// Callback URL; the vendor spells the field `recipent_url`
    #[serde(
        default,
        alias = "recipient_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub recipent_url: Option<String>,

    /// Caller's API token, forwarded as-is
    #[serde(skip)]
    pub api_token: String,
}

/// The upstream's answer, already extracted from its response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamReply {
    /// HTTP status the upstream answered with
    pub status: u16,

    /// The chatbot's answer text
    pub answer: String,
}

/// The core Upstream trait.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// A human-readable name for this upstream (e.g. "simplifique").
    fn name(&self) -> &str;

    /// Send a request and wait for the chatbot's answer.
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamReply, UpstreamError>;
}
