//! Research agents
//!
//! Agents are the reasoning side of the step contract: a step whose executor
//! is [`crate::steps::Executor::Agent`] is served by whichever agent the
//! [`AgentRegistry`] has registered for its [`AgentMode`].
//!
//! Agents hold no per-run state. Everything they need arrives in the
//! parameter map and everything they produce leaves in the response.

pub mod collector;
pub mod critic;
pub mod registry;
pub mod synthesis;

pub use collector::CollectorAgent;
pub use critic::DomainExpertAgent;
pub use registry::AgentRegistry;
pub use synthesis::{ExecutiveSummarizer, SynthesisAgent};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::steps::{DelegateResponse, Params};
use crate::types::{PipelineError, Result};

/// Closed set of agent activation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    PrimaryLookup,
    SecondaryDiscovery,
    Critique,
    Synthesize,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::PrimaryLookup => "primary_lookup",
            AgentMode::SecondaryDiscovery => "secondary_discovery",
            AgentMode::Critique => "critique",
            AgentMode::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primary_lookup" => Ok(AgentMode::PrimaryLookup),
            "secondary_discovery" => Ok(AgentMode::SecondaryDiscovery),
            "critique" => Ok(AgentMode::Critique),
            "synthesize" => Ok(AgentMode::Synthesize),
            other => Err(PipelineError::UnknownTag {
                kind: "agent mode",
                tag: other.to_string(),
            }),
        }
    }
}

/// Base trait for all research agents
#[async_trait]
pub trait ResearchAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Modes this agent serves.
    fn modes(&self) -> &[AgentMode];

    async fn activate(&self, mode: AgentMode, params: Params) -> Result<DelegateResponse>;
}

/// Error for a mode routed to an agent that does not serve it.
pub(crate) fn unsupported_mode(agent: &str, mode: AgentMode) -> PipelineError {
    PipelineError::InvalidInput(format!("agent '{}' does not support mode '{}'", agent, mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tags() {
        for mode in [
            AgentMode::PrimaryLookup,
            AgentMode::SecondaryDiscovery,
            AgentMode::Critique,
            AgentMode::Synthesize,
        ] {
            assert_eq!(mode.as_str().parse::<AgentMode>().unwrap(), mode);
        }
        assert!(matches!(
            "daydream".parse::<AgentMode>(),
            Err(PipelineError::UnknownTag { .. })
        ));
    }
}
