use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{AgentMode, ResearchAgent};
use crate::steps::{AgentActivator, DelegateResponse, Params};
use crate::types::{PipelineError, Result};

/// Routes activation modes to agents.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentMode, Arc<dyn ResearchAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent` for every mode it serves, replacing earlier agents
    /// for those modes.
    pub fn register(&mut self, agent: Arc<dyn ResearchAgent>) {
        for mode in agent.modes() {
            self.agents.insert(*mode, Arc::clone(&agent));
        }
    }

    pub fn with_agent(mut self, agent: Arc<dyn ResearchAgent>) -> Self {
        self.register(agent);
        self
    }

    pub fn has_mode(&self, mode: AgentMode) -> bool {
        self.agents.contains_key(&mode)
    }

    /// Distinct agent names, sorted.
    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.values().map(|a| a.name().to_string()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Activate by string tag; unknown tags are rejected at the boundary.
    pub async fn activate_by_tag(&self, mode: &str, params: Params) -> Result<DelegateResponse> {
        let mode: AgentMode = mode.parse()?;
        self.activate(mode, params).await
    }
}

#[async_trait]
impl AgentActivator for AgentRegistry {
    async fn activate(&self, mode: AgentMode, params: Params) -> Result<DelegateResponse> {
        let agent = self
            .agents
            .get(&mode)
            .ok_or_else(|| {
                PipelineError::NotFound(format!("No agent registered for mode '{}'", mode))
            })?;

        tracing::debug!(agent = agent.name(), mode = %mode, "Activating agent");
        agent.activate(mode, params).await
    }
}
