//! `chatbridge assemble` — Flatten a message list offline.
//!
//! Accepts either a bare JSON array of messages or an OpenAI request body
//! with a `messages` field.

use std::io::Read;
use std::path::PathBuf;

use chatbridge_config::AppConfig;
use chatbridge_core::message::Message;
use chatbridge_core::prompt::{AssembledPrompt, PromptAssembler, unrecognized_roles};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum MessagesInput {
    List(Vec<Message>),
    Request { messages: Vec<Message> },
}

impl MessagesInput {
    fn into_messages(self) -> Vec<Message> {
        match self {
            MessagesInput::List(messages) | MessagesInput::Request { messages } => messages,
        }
    }
}

pub async fn run(file: Option<PathBuf>, text_only: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let input = match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let assembler = PromptAssembler::new(config.prompt.labels());
    let prompt = assemble_input(&assembler, &input)?;

    if text_only {
        println!("{}", prompt.final_prompt);
    } else {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    }

    Ok(())
}

fn assemble_input(
    assembler: &PromptAssembler,
    input: &str,
) -> Result<AssembledPrompt, Box<dyn std::error::Error>> {
    let messages = serde_json::from_str::<MessagesInput>(input)
        .map_err(|e| format!("Input is not a message list: {e}"))?
        .into_messages();

    for (index, role) in unrecognized_roles(&messages) {
        tracing::warn!(index, role, "Skipping message with unrecognized role");
    }

    Ok(assembler.assemble(&messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_list() {
        let prompt = assemble_input(
            &PromptAssembler::default(),
            r#"[{"role":"system","content":"S"},{"role":"user","content":"Hi"}]"#,
        )
        .unwrap();
        assert_eq!(prompt.final_prompt, "S\n\nHistórico:\nUsuário: Hi");
    }

    #[test]
    fn accepts_request_body() {
        let prompt = assemble_input(
            &PromptAssembler::default(),
            r#"{"model":"bot","messages":[{"role":"user","content":"A"},{"role":"assistant","content":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(prompt.history, "Usuário: A\nAssistente: B");
    }

    #[test]
    fn rejects_other_json() {
        assert!(assemble_input(&PromptAssembler::default(), r#"{"prompt":"x"}"#).is_err());
    }
}
