//! Resume signal port for suspended runs.
//!
//! When a phase fails critically and the HiL mode is `interactive`, the
//! orchestrator persists WAITING_FOR_HUMAN and then asks this port for a
//! [`ResumeSignal`], bounded by the configured resume timeout.
//!
//! # Flow
//!
//! ```text
//! Phase: all agents failed
//!        ↓
//! RUNNING → WAITING_FOR_HUMAN (persisted)
//!        ↓
//! ResumeSignalPort::wait_for_signal()
//!        ↓
//! retry / skip / abort   (or timeout → FAILED)
//! ```
//!
//! # Built-in Implementations
//!
//! - [`NoResumeSignal`] - never answers, so the resume timeout decides
//! - [`ScriptedResumeSignal`] - replays a fixed list of signals
//!
//! For interactive use, see `StdinResumePrompt` in the presentation layer.

use async_trait::async_trait;
use sixhats_domain::{ResumeSignal, Suspension, Workspace};
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Failures while collecting a signal, as opposed to a signal itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResumeSignalError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[async_trait]
pub trait ResumeSignalPort: Send + Sync {
    /// Wait for a human decision about `suspension`
    async fn wait_for_signal(
        &self,
        workspace: &Workspace,
        suspension: &Suspension,
    ) -> Result<ResumeSignal, ResumeSignalError>;
}

/// Never produces a signal
pub struct NoResumeSignal;

#[async_trait]
impl ResumeSignalPort for NoResumeSignal {
    async fn wait_for_signal(
        &self,
        _workspace: &Workspace,
        _suspension: &Suspension,
    ) -> Result<ResumeSignal, ResumeSignalError> {
        std::future::pending().await
    }
}

/// Replays queued signals in order, then behaves like [`NoResumeSignal`]
#[derive(Default)]
pub struct ScriptedResumeSignal {
    signals: Mutex<VecDeque<ResumeSignal>>,
}

impl ScriptedResumeSignal {
    pub fn new(signals: impl IntoIterator<Item = ResumeSignal>) -> Self {
        Self {
            signals: Mutex::new(signals.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.signals.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ResumeSignalPort for ScriptedResumeSignal {
    async fn wait_for_signal(
        &self,
        _workspace: &Workspace,
        _suspension: &Suspension,
    ) -> Result<ResumeSignal, ResumeSignalError> {
        let next = self
            .signals
            .lock()
            .map_err(|_| ResumeSignalError::IoError("signal queue poisoned".to_string()))?
            .pop_front();
        match next {
            Some(signal) => Ok(signal),
            None => std::future::pending().await,
        }
    }
}
