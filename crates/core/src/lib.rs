//! # ChatBridge Core
//!
//! Domain types, prompt assembly and error definitions for ChatBridge,
//! the OpenAI → Simplifique.ai translation gateway.
//! This crate has **no HTTP dependencies**: it defines the domain model
//! that the upstream client and the gateway implement against.
//!
//! ## Layout
//!
//! - [`message`]: role-tagged chat messages
//! - [`prompt`]: flattens a message list into system text + transcript
//! - [`extract`]: pulls the latest user turn, `@meta:` directives and custom
//!   prompts out of a message list
//! - [`upstream`]: the trait the vendor client implements

pub mod error;
pub mod extract;
pub mod message;
pub mod prompt;
pub mod upstream;

// Re-export key types at crate root for ergonomics
pub use error::{RequestError, UpstreamError};
pub use message::{Message, Role};
pub use prompt::{AssembledPrompt, PromptAssembler, PromptLabels};
pub use upstream::{Upstream, UpstreamReply, UpstreamRequest};
