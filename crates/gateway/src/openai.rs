//! OpenAI chat-completions wire types.
//!
//! Only the fields the bridge reads are modelled; anything else a client
//! sends (`stream`, `tools`, `top_p`, ...) is ignored.

use chatbridge_core::message::Message;
use serde::{Deserialize, Serialize};

/// `POST /v1/chat/completions` request body.
///
/// Besides the standard fields, the Simplifique-specific extras can be
/// passed at the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Used as the chatbot UUID when none is given explicitly
    pub model: String,

    pub messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chatbot_uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_base_system_prompt: Option<String>,

    #[serde(
        default,
        alias = "recipient_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub recipent_url: Option<String>,
}

impl ChatCompletionRequest {
    /// Requested temperature, 1.0 when unset.
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(1.0)
    }
}

/// `chat.completion` response object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: CompletionUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: String,
}

/// Token counts, estimated at 4 bytes per token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl CompletionUsage {
    pub fn estimate(prompt: &str, completion: &str) -> Self {
        let prompt_tokens = estimate_tokens(prompt);
        let completion_tokens = estimate_tokens(completion);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

fn estimate_tokens(text: &str) -> u32 {
    u32::try_from(text.len() / 4).unwrap_or(u32::MAX)
}

impl ChatCompletionResponse {
    /// Wrap a single assistant answer.
    pub fn from_answer(model: impl Into<String>, prompt: &str, answer: impl Into<String>) -> Self {
        let answer = answer.into();
        let usage = CompletionUsage::estimate(prompt, &answer);
        let id = uuid::Uuid::new_v4().simple().to_string();

        Self {
            id: format!("chatcmpl-{}", &id[..10]),
            object: "chat.completion".into(),
            created: chrono::Utc::now().timestamp(),
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(answer),
                finish_reason: "stop".into(),
            }],
            usage,
        }
    }
}
