//! Language model clients
//!
//! Agents that need generated text (expert questions, critiques, executive
//! summaries) talk to a [`LanguageModelClient`]. Which implementation they
//! get is decided once, when the [`Provider`] is turned into a client:
//!
//! - `ollama` - local Ollama server via `ollama-rs` (feature `ollama`)
//! - `openai` - any OpenAI-compatible `/chat/completions` endpoint over reqwest
//! - `scripted` - deterministic responses for tests and offline runs
//!
//! A completion that the backend rejects comes back as a
//! [`LanguageModelResponse`] with `status = Error`; only transport failures
//! are returned as `Err`.

/// Client trait, response types and provider selection.
pub mod client;
/// OpenAI-compatible HTTP client.
pub mod openai;
/// Deterministic keyword-scripted model.
pub mod scripted;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{
    strip_list_marker, CompletionStatus, GenerationParams, LanguageModelClient,
    LanguageModelResponse, Provider,
};
pub use openai::OpenAICompatibleClient;
pub use scripted::ScriptedLanguageModel;
