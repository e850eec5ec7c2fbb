//! Helpers that pull request parameters out of a message list.
//!
//! Clients that can only send `messages` (no extra JSON fields) pass
//! settings through system messages of the form `@meta:key=value`.

use std::collections::HashMap;

use crate::message::{Message, Role};

/// Prefix marking a system message as a metadata directive.
pub const META_PREFIX: &str = "@meta:";

/// Content of the last `user` message, if any.
pub fn latest_user_message(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

/// Collect `@meta:key=value` directives from system messages.
///
/// The pair is split on the first `=`; directives without one are skipped.
/// A later directive for the same key replaces an earlier one.
pub fn meta_directives(messages: &[Message]) -> HashMap<String, String> {
    messages
        .iter()
        .filter(|m| m.role == Role::System)
        .filter_map(|m| m.content.strip_prefix(META_PREFIX))
        .filter_map(|directive| directive.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// True for a system message carrying a `@meta:` directive.
pub fn is_meta_directive(message: &Message) -> bool {
    message.role == Role::System && message.content.starts_with(META_PREFIX)
}

/// The conversation with metadata directives removed, in original order.
pub fn without_meta_directives(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| !is_meta_directive(m))
        .cloned()
        .collect()
}

/// Content of the last system message that is not a metadata directive.
pub fn custom_prompt(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::System && !is_meta_directive(m))
        .map(|m| m.content.as_str())
}
