//! Agent port
//!
//! An agent is an opaque async capability that turns a role, a persona and
//! the scenario into a contribution. Implementations (LLM-backed or offline)
//! live in the infrastructure layer.

use async_trait::async_trait;
use sixhats_domain::{AgentInfo, ContributionDraft, Role, RunId, Scenario, Synthesis};
use thiserror::Error;

/// Errors an agent invocation can return
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Timeout")]
    Timeout,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed output: {0}")]
    Malformed(String),

    #[error("Cancelled")]
    Cancelled,
}

impl AgentError {
    /// Transient errors are worth retrying; everything else is final
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AgentError::Timeout | AgentError::RateLimited(_) | AgentError::Unavailable(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }

    /// Short machine-readable kind for audit records
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Timeout => "timeout",
            AgentError::RateLimited(_) => "rate_limited",
            AgentError::Unavailable(_) => "unavailable",
            AgentError::Validation(_) => "validation",
            AgentError::Malformed(_) => "malformed",
            AgentError::Cancelled => "cancelled",
        }
    }
}

/// What an agent sees besides the scenario
#[derive(Debug, Clone)]
pub struct PhaseContext {
    pub run_id: RunId,
    pub phase_index: usize,
    /// Syntheses of the phases that already ran, in protocol order
    pub prior_syntheses: Vec<Synthesis>,
}

/// Port for invoking a single agent
#[async_trait]
pub trait AgentPort: Send + Sync {
    async fn invoke(
        &self,
        role: &Role,
        agent: &AgentInfo,
        scenario: &Scenario,
        context: &PhaseContext,
    ) -> Result<ContributionDraft, AgentError>;
}
