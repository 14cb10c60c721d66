//! Human-in-the-loop policy for critical failures.
//!
//! [`HilPolicy`] decides what the state machine does when a phase fails
//! critically: wait for a human, park the run for a later process, or fail
//! straight away.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a critical failure is handed to a human
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HilMode {
    /// Suspend and ask the resume-signal port, waiting up to the timeout
    #[default]
    Interactive,
    /// Persist WAITING_FOR_HUMAN and return; a later process replays the signal
    Detached,
    /// No human path: dead-letter and fail
    AutoFail,
}

impl HilMode {
    pub fn as_str(&self) -> &str {
        match self {
            HilMode::Interactive => "interactive",
            HilMode::Detached => "detached",
            HilMode::AutoFail => "auto_fail",
        }
    }

    pub fn has_human_path(&self) -> bool {
        !matches!(self, HilMode::AutoFail)
    }
}

impl std::fmt::Display for HilMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HilMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "interactive" => Ok(HilMode::Interactive),
            "detached" => Ok(HilMode::Detached),
            "auto_fail" => Ok(HilMode::AutoFail),
            _ => Err(format!(
                "unknown hil mode '{s}' (expected interactive, detached, auto_fail)"
            )),
        }
    }
}

/// Policy consulted by the orchestration state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HilPolicy {
    pub mode: HilMode,
    /// How long an interactive suspension waits for a signal
    pub resume_timeout: Duration,
}

impl Default for HilPolicy {
    fn default() -> Self {
        Self {
            mode: HilMode::Interactive,
            resume_timeout: Duration::from_secs(3600),
        }
    }
}

impl HilPolicy {
    pub fn with_mode(mut self, mode: HilMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_resume_timeout(mut self, timeout: Duration) -> Self {
        self.resume_timeout = timeout;
        self
    }
}

/// What the human chose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeAction {
    /// Re-attempt the suspended phase
    Retry,
    /// Advance past the suspended phase
    Skip,
    /// Fail the run
    Abort,
}

impl ResumeAction {
    pub fn as_str(&self) -> &str {
        match self {
            ResumeAction::Retry => "retry",
            ResumeAction::Skip => "skip",
            ResumeAction::Abort => "abort",
        }
    }
}

impl std::fmt::Display for ResumeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResumeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retry" => Ok(ResumeAction::Retry),
            "skip" => Ok(ResumeAction::Skip),
            "abort" => Ok(ResumeAction::Abort),
            _ => Err(format!("unknown resume action '{s}' (expected retry, skip, abort)")),
        }
    }
}

/// External signal that ends a suspension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSignal {
    pub action: ResumeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_actor() -> String {
    "human".to_string()
}

impl ResumeSignal {
    pub fn new(action: ResumeAction) -> Self {
        Self {
            action,
            note: None,
            actor: default_actor(),
        }
    }

    pub fn retry() -> Self {
        Self::new(ResumeAction::Retry)
    }

    pub fn skip() -> Self {
        Self::new(ResumeAction::Skip)
    }

    pub fn abort() -> Self {
        Self::new(ResumeAction::Abort)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}
