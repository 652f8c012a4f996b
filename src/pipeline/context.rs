use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::PipelineRequest;
use crate::agents::AgentRegistry;
use crate::types::{ResearchScope, SynthesisMode};

/// Phase of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Initialization,
    Collection,
    Processing,
    Collaboration,
    Synthesis,
    Completed,
    Failed,
}

impl PipelinePhase {
    /// Phase after this one. Collaboration is skipped when disabled.
    pub fn next(&self, collaboration_enabled: bool) -> Self {
        match self {
            PipelinePhase::Initialization => PipelinePhase::Collection,
            PipelinePhase::Collection => PipelinePhase::Processing,
            PipelinePhase::Processing if collaboration_enabled => PipelinePhase::Collaboration,
            PipelinePhase::Processing => PipelinePhase::Synthesis,
            PipelinePhase::Collaboration => PipelinePhase::Synthesis,
            PipelinePhase::Synthesis => PipelinePhase::Completed,
            PipelinePhase::Completed => PipelinePhase::Completed,
            PipelinePhase::Failed => PipelinePhase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelinePhase::Completed | PipelinePhase::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelinePhase::Initialization => "Initialization",
            PipelinePhase::Collection => "Collection",
            PipelinePhase::Processing => "Processing",
            PipelinePhase::Collaboration => "Collaboration",
            PipelinePhase::Synthesis => "Synthesis",
            PipelinePhase::Completed => "Completed",
            PipelinePhase::Failed => "Failed",
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Timing of one finished phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: PipelinePhase,
    pub duration_secs: f64,
}

/// Per-run state. Only the orchestrator writes to it.
pub struct PipelineContext {
    pub research_topic: String,
    pub research_scope: ResearchScope,
    pub max_sources: usize,
    pub synthesis_mode: SynthesisMode,
    pub enable_agent_conversations: bool,
    pub start_time: DateTime<Utc>,
    pub agent_registry: Arc<AgentRegistry>,
    phase: PipelinePhase,
    started: Instant,
    phase_started: Instant,
    completed_phases: Vec<PipelinePhase>,
    timings: Vec<PhaseTiming>,
    warnings: Vec<String>,
}

impl PipelineContext {
    pub fn new(request: &PipelineRequest, agent_registry: Arc<AgentRegistry>) -> Self {
        let now = Instant::now();
        Self {
            research_topic: request.research_topic.clone(),
            research_scope: request.research_scope,
            max_sources: request.max_sources,
            synthesis_mode: request.synthesis_mode,
            enable_agent_conversations: request.enable_agent_conversations,
            start_time: Utc::now(),
            agent_registry,
            phase: PipelinePhase::Initialization,
            started: now,
            phase_started: now,
            completed_phases: Vec::new(),
            timings: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Move to the next phase and restart the phase clock.
    pub fn advance(&mut self) -> PipelinePhase {
        self.phase = self.phase.next(self.enable_agent_conversations);
        self.phase_started = Instant::now();
        tracing::debug!(phase = %self.phase, "Pipeline phase started");
        self.phase
    }

    /// Record the current phase as completed.
    pub fn complete_phase(&mut self) {
        self.completed_phases.push(self.phase);
        self.record_timing();
    }

    /// Record the current phase's timing without counting it as completed.
    pub fn skip_phase(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
        self.record_timing();
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn fail(&mut self) {
        self.record_timing();
        self.phase = PipelinePhase::Failed;
    }

    fn record_timing(&mut self) {
        self.timings.push(PhaseTiming {
            phase: self.phase,
            duration_secs: self.phase_started.elapsed().as_secs_f64(),
        });
    }

    pub fn completed_phases(&self) -> &[PipelinePhase] {
        &self.completed_phases
    }

    pub fn timings(&self) -> &[PhaseTiming] {
        &self.timings
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
