//! Agent Conversation Coordination
//!
//! The [`ConversationCoordinator`] owns the append-only message log for a
//! single pipeline run. Every message is stamped with an id built from the
//! creation time and a per-log sequence number, and log order always equals
//! the order in which [`ConversationCoordinator::create_conversation`] was
//! called.
//!
//! The log sits behind a mutex so that concurrently produced content can be
//! appended from several tasks; the sequence number is assigned inside the
//! same critical section as the push, so ids and positions never disagree.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::{PipelineError, Result};

/// Kind of message exchanged between agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Question,
    Hypothesis,
    Insight,
    Analysis,
    HypothesisTest,
    Critique,
}

impl MessageType {
    /// Whether the recipient is expected to answer.
    pub fn requires_response(&self) -> bool {
        match self {
            MessageType::Question | MessageType::Hypothesis | MessageType::Critique => true,
            MessageType::Insight | MessageType::Analysis | MessageType::HypothesisTest => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Question => "question",
            MessageType::Hypothesis => "hypothesis",
            MessageType::Insight => "insight",
            MessageType::Analysis => "analysis",
            MessageType::HypothesisTest => "hypothesis_test",
            MessageType::Critique => "critique",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "question" => Ok(MessageType::Question),
            "hypothesis" => Ok(MessageType::Hypothesis),
            "insight" => Ok(MessageType::Insight),
            "analysis" => Ok(MessageType::Analysis),
            "hypothesis_test" => Ok(MessageType::HypothesisTest),
            "critique" => Ok(MessageType::Critique),
            other => Err(PipelineError::UnknownTag {
                kind: "message_type",
                tag: other.to_string(),
            }),
        }
    }
}

/// An immutable message between two named agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub project_id: String,
    pub agent_from: String,
    pub agent_to: String,
    pub message_type: MessageType,
    pub content: String,
    #[serde(default)]
    pub context_data: Value,
    pub response_required: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<Conversation>,
    next_sequence: u64,
}

/// Creates and records messages for one pipeline run.
#[derive(Debug)]
pub struct ConversationCoordinator {
    project_id: String,
    log: Mutex<LogState>,
}

impl ConversationCoordinator {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            log: Mutex::new(LogState::default()),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Create a message and append it to the log.
    pub fn create_conversation(
        &self,
        agent_from: &str,
        agent_to: &str,
        message_type: MessageType,
        content: &str,
        context_data: Value,
    ) -> Conversation {
        let mut log = self.log.lock();
        let sequence = log.next_sequence;
        log.next_sequence += 1;

        let timestamp = Utc::now();
        let conversation = Conversation {
            conversation_id: format!("conv_{}_{:06}", timestamp.timestamp_millis(), sequence),
            project_id: self.project_id.clone(),
            agent_from: agent_from.to_string(),
            agent_to: agent_to.to_string(),
            message_type,
            content: content.to_string(),
            context_data,
            response_required: message_type.requires_response(),
            timestamp,
        };

        log.entries.push(conversation.clone());
        tracing::debug!(
            id = %conversation.conversation_id,
            from = agent_from,
            to = agent_to,
            kind = %message_type,
            "Conversation recorded"
        );
        conversation
    }

    /// Send the same message to every recipient, in recipient order.
    pub fn broadcast(
        &self,
        agent_from: &str,
        message_type: MessageType,
        content: &str,
        context_data: Value,
        recipients: &[&str],
    ) -> Vec<Conversation> {
        recipients
            .iter()
            .map(|recipient| {
                self.create_conversation(
                    agent_from,
                    recipient,
                    message_type,
                    content,
                    context_data.clone(),
                )
            })
            .collect()
    }

    /// Snapshot of the full log in append order.
    pub fn history(&self) -> Vec<Conversation> {
        self.log.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages sent or received by `agent`.
    pub fn for_agent(&self, agent: &str) -> Vec<Conversation> {
        self.log
            .lock()
            .entries
            .iter()
            .filter(|c| c.agent_from == agent || c.agent_to == agent)
            .cloned()
            .collect()
    }

    /// Messages exchanged between two agents, in either direction.
    pub fn thread(&self, a: &str, b: &str) -> Vec<Conversation> {
        self.log
            .lock()
            .entries
            .iter()
            .filter(|c| {
                (c.agent_from == a && c.agent_to == b) || (c.agent_from == b && c.agent_to == a)
            })
            .cloned()
            .collect()
    }

    /// Messages that asked for a response and have not received one.
    ///
    /// A message counts as answered once the recipient has sent any later
    /// message back to the original sender.
    pub fn pending_responses(&self) -> Vec<Conversation> {
        let log = self.log.lock();
        log.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| c.response_required)
            .filter(|(i, c)| {
                !log.entries[i + 1..]
                    .iter()
                    .any(|later| later.agent_from == c.agent_to && later.agent_to == c.agent_from)
            })
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn counts_by_type(&self) -> BTreeMap<MessageType, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.log.lock().entries {
            *counts.entry(entry.message_type).or_insert(0) += 1;
        }
        counts
    }

    /// Consume the coordinator, returning the log.
    pub fn into_history(self) -> Vec<Conversation> {
        self.log.into_inner().entries
    }
}
