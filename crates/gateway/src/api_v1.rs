//! HTTP API v1 — the OpenAI-compatible surface.
//!
//! Endpoints:
//!
//! - `POST /v1/chat/completions` — translate, forward upstream, translate back
//! - `POST /v1/prompt/assemble`  — show how a message list would be flattened

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
};
use chatbridge_config::QueryMode;
use chatbridge_core::extract::{
    custom_prompt, latest_user_message, meta_directives, without_meta_directives,
};
use chatbridge_core::message::Message;
use chatbridge_core::prompt::{AssembledPrompt, unrecognized_roles};
use chatbridge_core::{RequestError, UpstreamRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::SharedState;
use crate::error::ApiError;
use crate::openai::{ChatCompletionRequest, ChatCompletionResponse};

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat/completions", post(chat_completions_handler))
        .route("/prompt/assemble", post(assemble_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct AssembleRequest {
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct AssembleResponse {
    #[serde(flatten)]
    prompt: AssembledPrompt,
    unrecognized_roles: Vec<RoleFlagDto>,
}

#[derive(Serialize, Deserialize)]
struct RoleFlagDto {
    index: usize,
    role: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_completions_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatCompletionResponse>, ApiError> {
    if state.config.gateway.debug_mode {
        info!(payload = %String::from_utf8_lossy(&body), "Payload received");
    }

    let request: ChatCompletionRequest = parse_body(&body)?;
    let api_token = bearer_token(&headers)?;

    debug!(
        model = %request.model,
        messages = request.messages.len(),
        temperature = request.temperature(),
        max_tokens = ?request.max_tokens,
        "v1/chat/completions request"
    );

    let upstream_request = translate_request(&state, &request, api_token)?;
    let chatbot_uuid = upstream_request.chatbot_uuid.clone();
    let user_key = upstream_request.user_key.clone();
    let query = upstream_request.query.clone();

    let reply = state.upstream.send(upstream_request).await?;

    info!(
        chatbot = %chatbot_uuid,
        user_key = %user_key,
        upstream = state.upstream.name(),
        status = reply.status,
        "Request completed"
    );

    Ok(Json(ChatCompletionResponse::from_answer(
        chatbot_uuid,
        &query,
        reply.answer,
    )))
}

async fn assemble_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<AssembleResponse>, ApiError> {
    let request: AssembleRequest = parse_body(&body)?;

    let flags = unrecognized_roles(&request.messages)
        .into_iter()
        .map(|(index, role)| RoleFlagDto {
            index,
            role: role.to_string(),
        })
        .collect();

    Ok(Json(AssembleResponse {
        prompt: state.assembler.assemble(&request.messages),
        unrecognized_roles: flags,
    }))
}

// ── Translation ───────────────────────────────────────────────────────────

/// Turn an OpenAI-style request into the upstream message.
///
/// Field precedence: explicit body field, then `@meta:` directive, then
/// fallback (`model` for the chatbot, a generated key for the user).
///
/// In transcript mode the system text already leads `query`, so only an
/// explicit body `custom_base_system_prompt` is forwarded alongside it.
fn translate_request(
    state: &crate::GatewayState,
    request: &ChatCompletionRequest,
    api_token: &str,
) -> Result<UpstreamRequest, RequestError> {
    check_roles(state, &request.messages)?;

    let meta = meta_directives(&request.messages);

    let chatbot_uuid = non_empty(request.chatbot_uuid.as_deref())
        .or_else(|| non_empty(meta.get("chatbot_uuid").map(String::as_str)))
        .or_else(|| non_empty(Some(request.model.as_str())))
        .ok_or(RequestError::MissingChatbotUuid)?
        .to_string();

    let user_key = non_empty(request.user_key.as_deref())
        .or_else(|| non_empty(meta.get("user_key").map(String::as_str)))
        .map(str::to_string)
        .unwrap_or_else(|| generate_user_key(&state.config.session.base_user_key));

    let explicit_prompt = non_empty(request.custom_base_system_prompt.as_deref());

    let latest = latest_user_message(&request.messages).ok_or(RequestError::NoUserMessage)?;

    let (query, custom_base_system_prompt) = match state.config.prompt.query_mode {
        QueryMode::LatestMessage => (
            latest.to_string(),
            explicit_prompt.or_else(|| non_empty(custom_prompt(&request.messages))),
        ),
        QueryMode::Transcript => {
            let conversation = without_meta_directives(&request.messages);
            (state.assembler.assemble(&conversation).final_prompt, explicit_prompt)
        }
    };
    let custom_base_system_prompt = custom_base_system_prompt.map(str::to_string);

    Ok(UpstreamRequest {
        chatbot_uuid,
        user_key,
        query,
        custom_base_system_prompt,
        recipent_url: non_empty(request.recipent_url.as_deref()).map(str::to_string),
        api_token: api_token.to_string(),
    })
}

/// Flag roles the assembler will drop; reject them in strict mode.
fn check_roles(state: &crate::GatewayState, messages: &[Message]) -> Result<(), RequestError> {
    let flagged = unrecognized_roles(messages);
    let Some(&(index, role)) = flagged.first() else {
        return Ok(());
    };

    if state.config.prompt.strict_roles {
        return Err(RequestError::UnrecognizedRole {
            index,
            role: role.to_string(),
        });
    }

    if state.config.prompt.warn_unrecognized_roles {
        warn!(
            count = flagged.len(),
            first_index = index,
            first_role = role,
            "Messages with unrecognized roles are left out of the prompt"
        );
    }

    Ok(())
}

fn generate_user_key(base: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{base}_{}", &id[..8])
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, RequestError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(RequestError::MissingBearerToken)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(RequestError::MissingBearerToken)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(RequestError::MissingBearerToken);
    }

    Ok(token)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, RequestError> {
    serde_json::from_slice(body).map_err(|e| RequestError::InvalidPayload(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────
