//! Error types for the ChatBridge domain.
//!
//! Each side of the gateway has its own error enum: [`RequestError`] for
//! what the client sent, [`UpstreamError`] for what the vendor answered.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    #[error("Connection to upstream failed: {0}")]
    Network(String),

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Upstream returned a non-JSON body: {0}")]
    InvalidResponse(String),

    #[error("Upstream rejected the request: {detail} (status: {status})")]
    Status { status: u16, detail: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Missing or invalid Authorization header, use Bearer <API_KEY>")]
    MissingBearerToken,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("chatbot_uuid missing (use the model or chatbot_uuid field)")]
    MissingChatbotUuid,

    #[error("No user message found in payload")]
    NoUserMessage,

    #[error("Unrecognized role '{role}' at messages[{index}]")]
    UnrecognizedRole { index: usize, role: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_error_displays_correctly() {
        let err = UpstreamError::Status {
            status: 404,
            detail: "Chatbot not found".into(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Chatbot not found"));
    }

    #[test]
    fn unrecognized_role_names_index() {
        let err = RequestError::UnrecognizedRole {
            index: 2,
            role: "tool".into(),
        };
        assert_eq!(err.to_string(), "Unrecognized role 'tool' at messages[2]");
    }
}
