//! Run identity and control state.
//!
//! The run is owned by the orchestrator: only phase boundaries and failure
//! transitions change it, and only through the state machine in
//! [`crate::orchestration`].

use crate::core::ids::RunId;
use crate::protocol::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    WaitingForHuman,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::WaitingForHuman => "waiting_for_human",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who drives the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Fully automated
    #[default]
    Auto,
    /// A human acts as the Blue Hat
    HumanBlue,
    /// A human can intervene at any point
    Hybrid,
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(RunMode::Auto),
            "human_blue" | "human-blue" => Ok(RunMode::HumanBlue),
            "hybrid" => Ok(RunMode::Hybrid),
            _ => Err(format!("unknown run mode: {s}")),
        }
    }
}

/// Category of a failure serious enough to stop the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalKind {
    /// Every agent of the phase failed
    AllAgentsFailed,
    /// The record store could not be reached
    StoreUnavailable,
    /// A workspace invariant did not hold
    InvariantViolation,
}

impl CriticalKind {
    pub fn as_str(&self) -> &str {
        match self {
            CriticalKind::AllAgentsFailed => "all_agents_failed",
            CriticalKind::StoreUnavailable => "store_unavailable",
            CriticalKind::InvariantViolation => "invariant_violation",
        }
    }
}

impl std::fmt::Display for CriticalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a run is waiting for a human, persisted so the wait survives restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspension {
    pub phase_index: usize,
    pub role: Role,
    pub kind: CriticalKind,
    pub message: String,
    pub suspended_at: DateTime<Utc>,
}

impl Suspension {
    /// Whether `timeout` has elapsed since the run was suspended.
    ///
    /// A suspension stamped in the future (clock skew) is not expired.
    pub fn is_expired(&self, timeout: std::time::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.suspended_at)
            .to_std()
            .map(|waited| waited > timeout)
            .unwrap_or(false)
    }
}

/// Metadata and control state of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: RunId,
    /// `name:version` of the protocol, e.g. `six_thinking_hats:v1`
    pub protocol: String,
    pub status: RunStatus,
    #[serde(default)]
    pub mode: RunMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_initiator")]
    pub initiator: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Index of the phase executing now, or next to execute
    #[serde(default)]
    pub cursor: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension: Option<Suspension>,
}

fn default_initiator() -> String {
    "system".to_string()
}

impl Run {
    pub fn new(protocol: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::generate(),
            protocol: protocol.into(),
            status: RunStatus::Pending,
            mode: RunMode::default(),
            created_at: now,
            updated_at: now,
            initiator: default_initiator(),
            tags: Vec::new(),
            cursor: 0,
            suspension: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn suspension_at(suspended_at: DateTime<Utc>) -> Suspension {
        Suspension {
            phase_index: 1,
            role: Role::Black,
            kind: CriticalKind::AllAgentsFailed,
            message: "every agent failed".to_string(),
            suspended_at,
        }
    }

    #[test]
    fn test_suspension_expiry() {
        let now = Utc::now();
        let s = suspension_at(now - chrono::Duration::seconds(120));
        assert!(s.is_expired(Duration::from_secs(60), now));
        assert!(!s.is_expired(Duration::from_secs(600), now));
        // skewed clock: suspended "later" than now
        let ahead = suspension_at(now + chrono::Duration::seconds(30));
        assert!(!ahead.is_expired(Duration::from_secs(1), now));
    }

    #[test]
    fn test_new_run_is_pending() {
        let run = Run::new("six_thinking_hats:v1");
        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(run.cursor, 0);
        assert!(run.suspension.is_none());
        assert_eq!(run.initiator, "system");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::WaitingForHuman.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_wire_name() {
        let json = serde_json::to_string(&RunStatus::WaitingForHuman).unwrap();
        assert_eq!(json, "\"WAITING_FOR_HUMAN\"");
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("human-blue".parse::<RunMode>().unwrap(), RunMode::HumanBlue);
        assert_eq!("AUTO".parse::<RunMode>().unwrap(), RunMode::Auto);
        assert!("manual".parse::<RunMode>().is_err());
    }
}
