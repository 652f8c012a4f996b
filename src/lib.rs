//! # ARES Research - multi-phase research synthesis pipeline
//!
//! Composes independent research agents (collectors, a domain expert, a
//! hypothesis engine, a synthesizer) into one knowledge-synthesis result.
//!
//! ## Overview
//!
//! A run moves through fixed phases:
//!
//! 1. **Collection** - primary reference lookup, then secondary discovery
//!    seeded by the primary article's references
//! 2. **Processing** - extract, transform, analyze and validate facts
//! 3. **Collaboration** (optional) - expert questions, hypotheses, claim
//!    testing, critique and refinement, recorded as a conversation log
//! 4. **Synthesis** - a knowledge base with confidence scores and
//!    recommendations, or a fallback built from raw sources
//!
//! Every unit of work is a [`Step`](steps::Step) with declared input and
//! output schemas. External systems are reached through narrow traits:
//! [`CollectorClient`](collectors::CollectorClient),
//! [`TextAnalysisClient`](collectors::TextAnalysisClient),
//! [`LanguageModelClient`](llm::LanguageModelClient) and
//! [`PersistenceClient`](persistence::PersistenceClient).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ares_research::{PipelineOrchestrator, PipelineRequest, ResearchConfig};
//!
//! let config = ResearchConfig::load("research.toml")?;
//! let orchestrator = PipelineOrchestrator::from_config(&config)?;
//! let result = orchestrator.execute(PipelineRequest::new("climate policy")).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Research agents and the mode-keyed agent registry.
pub mod agents;
/// Command-line interface.
pub mod cli;
/// Data collection and text analysis collaborators.
pub mod collectors;
/// Structured messages between agents.
pub mod conversation;
/// Evidence bundling and scoring.
pub mod evidence;
/// Hypothesis generation, testing and refinement.
pub mod hypothesis;
/// Language model clients.
pub mod llm;
/// Result persistence.
pub mod persistence;
/// Phase sequencing and the orchestrator.
pub mod pipeline;
/// Processing-chain functions.
pub mod processing;
/// Step contract and registry.
pub mod steps;
/// Knowledge base synthesis.
pub mod synthesis;
/// Core types and errors.
pub mod types;
/// Configuration.
pub mod utils;

pub use agents::{AgentMode, AgentRegistry, ResearchAgent};
pub use conversation::{Conversation, ConversationCoordinator, MessageType};
pub use evidence::{EvidenceAssessment, EvidenceScorer};
pub use hypothesis::{Hypothesis, HypothesisEngine};
pub use llm::{LanguageModelClient, Provider, ScriptedLanguageModel};
pub use pipeline::{PipelineOrchestrator, PipelineRequest, PipelineResult};
pub use steps::{Step, StepRegistry};
pub use synthesis::{KnowledgeBase, KnowledgeSynthesizer};
pub use types::{PipelineError, Result};
pub use utils::toml_config::{ResearchConfig, ResearchConfigManager};
