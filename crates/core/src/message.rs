//! Message domain types.
//!
//! These are the value objects that flow through the whole bridge:
//! client sends `messages` → gateway parses them → assembler flattens them →
//! upstream receives a single query.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a chat exchange.
///
/// Unrecognized role names (e.g. `tool`, `function`, `developer`) are kept
/// verbatim in [`Role::Other`] so callers can flag them instead of losing them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Any other role name
    Other(String),
}

impl Role {
    /// The wire name of this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(name) => name,
        }
    }

    /// Whether this is one of the three roles the bridge understands.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Role::Other(_))
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<Role>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, bridge!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, bridge!");
    }

    #[test]
    fn known_roles_parse_from_json() {
        let msgs: Vec<Message> = serde_json::from_str(
            r#"[{"role":"system","content":"s"},{"role":"user","content":"u"},{"role":"assistant","content":"a"}]"#,
        )
        .unwrap();
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[2].role, Role::Assistant);
    }

    #[test]
    fn unknown_role_is_preserved() {
        let msg: Message = serde_json::from_str(r#"{"role":"tool","content":"42"}"#).unwrap();
        assert_eq!(msg.role, Role::Other("tool".into()));
        assert!(!msg.role.is_recognized());

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
    }

    #[test]
    fn role_names_are_case_sensitive() {
        assert_eq!(Role::from("User"), Role::Other("User".into()));
    }

    #[test]
    fn missing_content_is_rejected() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"role":"user"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn non_text_content_is_rejected() {
        let result: Result<Message, _> =
            serde_json::from_str(r#"{"role":"user","content":[{"type":"text","text":"hi"}]}"#);
        assert!(result.is_err());
    }
}
