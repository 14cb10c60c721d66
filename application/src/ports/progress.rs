//! Progress notification port
//!
//! Defines the interface for reporting progress during a run.

use sixhats_domain::{Role, Suspension};
use std::time::Duration;

/// Callback for progress updates during a run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain log lines, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, index: usize, role: &Role, total_agents: usize);

    /// Called when one agent of the phase finishes
    fn on_agent_complete(&self, role: &Role, agent_id: &str, success: bool);

    /// Called when a phase's synthesis is attached
    fn on_phase_complete(&self, role: &Role, fallback: bool);

    /// Called before a transient failure is retried
    fn on_agent_retry(&self, _role: &Role, _agent_id: &str, _attempt: u32, _delay: Duration) {}

    /// Called when the run waits for a human
    fn on_suspended(&self, _suspension: &Suspension) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _index: usize, _role: &Role, _total_agents: usize) {}
    fn on_agent_complete(&self, _role: &Role, _agent_id: &str, _success: bool) {}
    fn on_phase_complete(&self, _role: &Role, _fallback: bool) {}
}
