//! Contribution - one agent's immutable output for one phase.

use crate::core::ids::new_id;
use crate::protocol::{AgentInfo, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token usage reported for a single call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
}

impl TokenCounts {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// What an agent hands back before the phase runner stamps identity onto it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionDraft {
    pub content: String,
    #[serde(default)]
    pub structured: Option<serde_json::Value>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub token_counts: TokenCounts,
}

impl ContributionDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.token_counts = TokenCounts::new(input, output);
        self
    }

    pub fn with_structured(mut self, value: serde_json::Value) -> Self {
        self.structured = Some(value);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// A raw contribution from an agent. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub contribution_id: String,
    pub role: Role,
    pub agent_info: AgentInfo,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
    /// `None` until an evaluation assesses it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub token_counts: TokenCounts,
    #[serde(default)]
    pub latency_ms: u64,
    /// Number of invocations it took to obtain this contribution
    #[serde(default = "one")]
    pub attempts: u32,
}

fn one() -> u32 {
    1
}

impl Contribution {
    pub fn from_draft(role: Role, agent_info: AgentInfo, draft: ContributionDraft) -> Self {
        Self {
            contribution_id: new_id(),
            role,
            agent_info,
            content: draft.content,
            structured: draft.structured,
            confidence: draft.confidence,
            tags: draft.tags,
            created_at: Utc::now(),
            token_counts: draft.token_counts,
            latency_ms: 0,
            attempts: 1,
        }
    }

    pub fn new(role: Role, agent_info: AgentInfo, content: impl Into<String>) -> Self {
        Self::from_draft(role, agent_info, ContributionDraft::new(content))
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_human(&self) -> bool {
        self.agent_info.model == "human"
    }
}
