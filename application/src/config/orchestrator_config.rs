//! Orchestrator parameters for the use case loop control.
//!
//! [`OrchestratorConfig`] groups what the driver needs beyond its ports:
//! the retry policy handed to the phase runner, per-call timeouts, the
//! fallback bound for the aggregator, and the human-in-the-loop policy
//! handed to the state machine.

use super::retry_policy::RetryPolicy;
use sixhats_domain::{DEFAULT_FALLBACK_KEY_POINTS, HilMode, HilPolicy};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,
    /// Bound on a single agent invocation; expiry counts as a transient timeout
    pub agent_timeout: Option<Duration>,
    /// Bound on a single reduction; expiry triggers the fallback synthesis
    pub aggregation_timeout: Option<Duration>,
    pub fallback_key_points: usize,
    pub hil: HilPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            agent_timeout: Some(Duration::from_secs(120)),
            aggregation_timeout: Some(Duration::from_secs(120)),
            fallback_key_points: DEFAULT_FALLBACK_KEY_POINTS,
            hil: HilPolicy::default(),
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_aggregation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.aggregation_timeout = timeout;
        self
    }

    pub fn with_fallback_key_points(mut self, n: usize) -> Self {
        self.fallback_key_points = n;
        self
    }

    pub fn with_hil(mut self, hil: HilPolicy) -> Self {
        self.hil = hil;
        self
    }

    pub fn with_hil_mode(mut self, mode: HilMode) -> Self {
        self.hil.mode = mode;
        self
    }

    pub fn with_resume_timeout(mut self, timeout: Duration) -> Self {
        self.hil.resume_timeout = timeout;
        self
    }
}
