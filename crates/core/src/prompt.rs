//! Prompt assembly: flattens a role-tagged message list into a single
//! system instruction plus a plain-text transcript.
//!
//! The upstream chatbot API takes one `query` string, so the structured
//! OpenAI history has to be rendered as text before it can be forwarded.
//!
//! Assembly is deterministic and allocation-local: identical inputs always
//! produce identical outputs, and no state is shared between calls.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Labels used when rendering the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptLabels {
    /// Prefix for user turns.
    pub user: String,
    /// Prefix for assistant turns.
    pub assistant: String,
    /// Header line placed between the system text and the history.
    pub history_header: String,
}

impl Default for PromptLabels {
    fn default() -> Self {
        Self {
            user: "Usuário".into(),
            assistant: "Assistente".into(),
            history_header: "Histórico:".into(),
        }
    }
}

/// The flattened prompt, ready to be embedded in an upstream request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledPrompt {
    /// Content of the first system message, or empty.
    pub system: String,
    /// User/assistant turns rendered as `<Label>: <content>`, one per line.
    pub history: String,
    /// `system`, a blank line, the history header, then `history`.
    #[serde(rename = "finalPrompt")]
    pub final_prompt: String,
}

/// Renders message lists into an [`AssembledPrompt`] using a fixed set of labels.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    labels: PromptLabels,
}

impl PromptAssembler {
    pub fn new(labels: PromptLabels) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &PromptLabels {
        &self.labels
    }

    /// Assemble the prompt.
    ///
    /// Only the first system message is used. Messages with roles other than
    /// `user` and `assistant` contribute nothing to the history.
    pub fn assemble(&self, messages: &[Message]) -> AssembledPrompt {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let history = messages
            .iter()
            .filter_map(|m| self.label_for(&m.role).map(|label| format!("{label}: {}", m.content)))
            .collect::<Vec<_>>()
            .join("\n");

        let final_prompt = format!("{system}\n\n{}\n{history}", self.labels.history_header);

        AssembledPrompt {
            system,
            history,
            final_prompt,
        }
    }

    fn label_for(&self, role: &Role) -> Option<&str> {
        match role {
            Role::User => Some(&self.labels.user),
            Role::Assistant => Some(&self.labels.assistant),
            Role::System | Role::Other(_) => None,
        }
    }
}

/// Assemble with the default (Portuguese) labels.
pub fn assemble(messages: &[Message]) -> AssembledPrompt {
    PromptAssembler::default().assemble(messages)
}

/// Index and role name of every message whose role is not
/// `system`, `user` or `assistant`.
pub fn unrecognized_roles(messages: &[Message]) -> Vec<(usize, &str)> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.role.is_recognized())
        .map(|(i, m)| (i, m.role.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: &str, content: &str) -> Message {
        Message::new(role, content)
    }

    #[test]
    fn system_and_single_user_turn() {
        let out = assemble(&[msg("system", "S"), msg("user", "Hi")]);
        assert_eq!(out.system, "S");
        assert_eq!(out.history, "Usuário: Hi");
        assert_eq!(out.final_prompt, "S\n\nHistórico:\nUsuário: Hi");
    }

    #[test]
    fn empty_input() {
        let out = assemble(&[]);
        assert_eq!(out.system, "");
        assert_eq!(out.history, "");
        assert_eq!(out.final_prompt, "\n\nHistórico:\n");
    }

    #[test]
    fn alternating_turns_without_system() {
        let out = assemble(&[msg("user", "A"), msg("assistant", "B"), msg("user", "C")]);
        assert_eq!(out.system, "");
        assert_eq!(out.history, "Usuário: A\nAssistente: B\nUsuário: C");
    }

    #[test]
    fn first_system_message_wins() {
        let out = assemble(&[msg("system", "First"), msg("system", "Second"), msg("user", "x")]);
        assert_eq!(out.system, "First");
        assert!(!out.final_prompt.contains("Second"));
    }

    #[test]
    fn unknown_roles_are_skipped() {
        let out = assemble(&[
            msg("user", "q"),
            msg("tool", "result"),
            msg("function", "f"),
            msg("assistant", "a"),
        ]);
        assert_eq!(out.history, "Usuário: q\nAssistente: a");
    }

    #[test]
    fn order_survives_interleaved_system_messages() {
        let out = assemble(&[
            msg("assistant", "1"),
            msg("system", "sys"),
            msg("user", "2"),
            msg("developer", "ignored"),
            msg("assistant", "3"),
        ]);
        assert_eq!(out.system, "sys");
        assert_eq!(out.history, "Assistente: 1\nUsuário: 2\nAssistente: 3");
    }

    #[test]
    fn content_is_not_escaped() {
        let out = assemble(&[msg("user", "line one\nUsuário: fake\t\"quoted\"")]);
        assert_eq!(out.history, "Usuário: line one\nUsuário: fake\t\"quoted\"");
    }

    #[test]
    fn final_prompt_shape_holds() {
        let inputs = vec![
            vec![],
            vec![msg("system", "only system")],
            vec![msg("user", "u"), msg("system", "late"), msg("assistant", "a")],
            vec![msg("tool", "t")],
        ];
        for messages in inputs {
            let out = assemble(&messages);
            assert_eq!(
                out.final_prompt,
                format!("{}\n\nHistórico:\n{}", out.system, out.history)
            );
        }
    }

    #[test]
    fn custom_labels() {
        let assembler = PromptAssembler::new(PromptLabels {
            user: "User".into(),
            assistant: "Assistant".into(),
            history_header: "History:".into(),
        });
        let out = assembler.assemble(&[msg("system", "Be brief"), msg("user", "Hi"), msg("assistant", "Hello")]);
        assert_eq!(out.history, "User: Hi\nAssistant: Hello");
        assert_eq!(out.final_prompt, "Be brief\n\nHistory:\nUser: Hi\nAssistant: Hello");
    }

    #[test]
    fn serializes_final_prompt_in_camel_case() {
        let json = serde_json::to_value(assemble(&[msg("user", "x")])).unwrap();
        assert_eq!(json["finalPrompt"], "\n\nHistórico:\nUsuário: x");
        assert!(json.get("final_prompt").is_none());
    }

    #[test]
    fn reports_unrecognized_roles_with_index() {
        let messages = [msg("user", "a"), msg("tool", "b"), msg("system", "c"), msg("function", "d")];
        assert_eq!(unrecognized_roles(&messages), vec![(1, "tool"), (3, "function")]);
        assert!(unrecognized_roles(&messages[..1]).is_empty());
    }
}
