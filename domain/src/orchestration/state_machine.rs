//! Run lifecycle as a pure function.
//!
//! ```text
//! PENDING --init--> RUNNING
//! RUNNING --phase committed, more remain--> RUNNING
//! RUNNING --phase committed, none remain--> COMPLETED
//! RUNNING --critical failure--> WAITING_FOR_HUMAN | FAILED (no human path)
//! WAITING_FOR_HUMAN --retry--> RUNNING (same phase)
//! WAITING_FOR_HUMAN --skip--> RUNNING (next phase) | COMPLETED
//! WAITING_FOR_HUMAN --abort | timeout--> FAILED
//! ```
//!
//! [`transition`] takes the workspace by value and hands back the updated
//! workspace plus the [`Action`] the driver must perform next. It never does
//! I/O. Every transition appends the audit events that describe it.

use super::policy::{HilMode, HilPolicy, ResumeAction, ResumeSignal};
use crate::core::error::DomainError;
use crate::protocol::Role;
use crate::workspace::audit::{AuditEvent, EventType};
use crate::workspace::entities::Workspace;
use crate::workspace::run::{CriticalKind, RunStatus, Suspension};
use chrono::Utc;
use serde_json::json;

const ORCHESTRATOR: &str = "orchestrator";

/// Input to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    /// Start a PENDING run
    Init,
    /// The current phase's contributions and synthesis are in the workspace
    PhaseCommitted,
    /// The current phase cannot proceed
    CriticalFailure { kind: CriticalKind, message: String },
    /// A human answered the suspension
    Resume(ResumeSignal),
    /// No answer arrived in time
    ResumeTimedOut,
}

impl OrchestratorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrchestratorEvent::Init => "init",
            OrchestratorEvent::PhaseCommitted => "phase_committed",
            OrchestratorEvent::CriticalFailure { .. } => "critical_failure",
            OrchestratorEvent::Resume(_) => "resume",
            OrchestratorEvent::ResumeTimedOut => "resume_timed_out",
        }
    }
}

/// What the driver does next
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Execute the phase at `index`
    RunPhase { index: usize, role: Role },
    /// Ask the resume-signal port and feed its answer back in
    AwaitHuman,
    /// Save and hand control back to the caller; the run stays suspended
    Detach,
    /// Write a dead letter, alert, and stop
    DeadLetter { reason: String },
    /// The run completed
    Finish,
}

/// Apply `event` to `workspace` under `policy`
pub fn transition(
    mut workspace: Workspace,
    event: &OrchestratorEvent,
    policy: &HilPolicy,
) -> Result<(Workspace, Action), DomainError> {
    let status = workspace.status();
    if status.is_terminal() {
        return Err(DomainError::RunTerminal(status));
    }

    let action = match (status, event) {
        (RunStatus::Pending, OrchestratorEvent::Init) => {
            set_status(&mut workspace, RunStatus::Running);
            workspace.run.cursor = 0;
            workspace.push_event(
                AuditEvent::new(EventType::RunStarted, ORCHESTRATOR).with_data(json!({
                    "phases": workspace.phases().len(),
                    "mode": workspace.run().mode,
                })),
            );
            next_phase(&mut workspace)
        }

        (RunStatus::Running, OrchestratorEvent::PhaseCommitted) => {
            let role = current_role(&workspace)?;
            let phase = workspace
                .phase(&role)
                .ok_or_else(|| DomainError::UnknownRole(role.to_string()))?;
            let data = json!({
                "contributions": phase.raw().len(),
                "synthesis_id": phase.synthesis().map(|s| s.synthesis_id.clone()),
                "fallback": phase.synthesis().map(|s| s.fallback).unwrap_or(false),
            });
            workspace.push_event(
                AuditEvent::new(EventType::PhaseCompleted, ORCHESTRATOR)
                    .with_role(role)
                    .with_data(data),
            );
            workspace.run.cursor += 1;
            next_phase(&mut workspace)
        }

        (RunStatus::Running, OrchestratorEvent::CriticalFailure { kind, message }) => {
            let role = current_role(&workspace)?;
            match policy.mode {
                HilMode::Interactive | HilMode::Detached => {
                    workspace.run.suspension = Some(Suspension {
                        phase_index: workspace.run().cursor,
                        role: role.clone(),
                        kind: *kind,
                        message: message.clone(),
                        suspended_at: Utc::now(),
                    });
                    set_status(&mut workspace, RunStatus::WaitingForHuman);
                    workspace.push_event(
                        AuditEvent::new(EventType::RunSuspended, ORCHESTRATOR)
                            .with_role(role)
                            .with_data(json!({
                                "kind": kind,
                                "message": message,
                                "hil_mode": policy.mode,
                            })),
                    );
                    if policy.mode == HilMode::Interactive {
                        Action::AwaitHuman
                    } else {
                        Action::Detach
                    }
                }
                HilMode::AutoFail => {
                    let reason = format!("{kind}: {message}");
                    fail(&mut workspace, Some(role), &reason);
                    Action::DeadLetter { reason }
                }
            }
        }

        (RunStatus::WaitingForHuman, OrchestratorEvent::Resume(signal)) => {
            let suspension = workspace.run.suspension.take();
            let role = suspension.as_ref().map(|s| s.role.clone());
            let mut resumed = AuditEvent::new(EventType::RunResumed, signal.actor.clone())
                .with_data(json!({
                    "action": signal.action,
                    "note": signal.note,
                    "suspended_kind": suspension.as_ref().map(|s| s.kind),
                }));
            if let Some(role) = &role {
                resumed = resumed.with_role(role.clone());
            }
            workspace.push_event(resumed);

            match signal.action {
                ResumeAction::Retry => {
                    set_status(&mut workspace, RunStatus::Running);
                    next_phase(&mut workspace)
                }
                ResumeAction::Skip => {
                    set_status(&mut workspace, RunStatus::Running);
                    let mut skipped = AuditEvent::new(EventType::PhaseSkipped, signal.actor.clone())
                        .with_data(json!({ "note": signal.note }));
                    if let Some(role) = role {
                        skipped = skipped.with_role(role);
                    }
                    workspace.push_event(skipped);
                    workspace.run.cursor += 1;
                    next_phase(&mut workspace)
                }
                ResumeAction::Abort => {
                    let reason = match &signal.note {
                        Some(note) => format!("aborted by {}: {note}", signal.actor),
                        None => format!("aborted by {}", signal.actor),
                    };
                    fail(&mut workspace, role, &reason);
                    Action::DeadLetter { reason }
                }
            }
        }

        (RunStatus::WaitingForHuman, OrchestratorEvent::ResumeTimedOut) => {
            let suspension = workspace.run.suspension.take();
            let reason = match &suspension {
                Some(s) => format!(
                    "no resume signal within {}s after {}: {}",
                    policy.resume_timeout.as_secs(),
                    s.kind,
                    s.message
                ),
                None => format!(
                    "no resume signal within {}s",
                    policy.resume_timeout.as_secs()
                ),
            };
            fail(&mut workspace, suspension.map(|s| s.role), &reason);
            Action::DeadLetter { reason }
        }

        (from, event) => {
            return Err(DomainError::InvalidTransition {
                from,
                event: event.name().to_string(),
            });
        }
    };

    Ok((workspace, action))
}

/// Run the phase at the cursor, or complete the run when none remain
fn next_phase(workspace: &mut Workspace) -> Action {
    let index = workspace.run().cursor;
    match workspace.phase_at(index).map(|p| p.role().clone()) {
        Some(role) => Action::RunPhase { index, role },
        None => {
            workspace.push_event(
                AuditEvent::new(EventType::RunCompleted, ORCHESTRATOR).with_data(json!({
                    "contributions": workspace.contribution_count(),
                    "artifacts": workspace.artifacts().len(),
                })),
            );
            set_status(workspace, RunStatus::Completed);
            Action::Finish
        }
    }
}

fn fail(workspace: &mut Workspace, role: Option<Role>, reason: &str) {
    let mut event = AuditEvent::new(EventType::RunFailed, ORCHESTRATOR)
        .with_data(json!({ "reason": reason, "cursor": workspace.run().cursor }));
    if let Some(role) = role {
        event = event.with_role(role);
    }
    workspace.push_event(event);
    workspace.run.suspension = None;
    set_status(workspace, RunStatus::Failed);
}

fn set_status(workspace: &mut Workspace, status: RunStatus) {
    workspace.run.status = status;
    workspace.run.touch();
}

fn current_role(workspace: &Workspace) -> Result<Role, DomainError> {
    let cursor = workspace.run().cursor;
    workspace
        .phase_at(cursor)
        .map(|p| p.role().clone())
        .ok_or_else(|| {
            DomainError::InvariantViolation(format!("no phase at cursor {cursor}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AgentInfo, PhaseSpec, ProtocolDefinition};
    use crate::scenario::Scenario;

    fn two_phase() -> ProtocolDefinition {
        ProtocolDefinition::new(
            "mini",
            "v1",
            vec![
                PhaseSpec::new(Role::White, vec![AgentInfo::new("w", "Facts")]),
                PhaseSpec::new(Role::Black, vec![AgentInfo::new("b", "Risks")]),
            ],
        )
    }

    fn workspace() -> Workspace {
        Workspace::new(Scenario::new("Launch", "Ship in Q3?"), &two_phase()).unwrap()
    }

    fn interactive() -> HilPolicy {
        HilPolicy::default()
    }

    fn critical() -> OrchestratorEvent {
        OrchestratorEvent::CriticalFailure {
            kind: CriticalKind::AllAgentsFailed,
            message: "all 1 agents failed".to_string(),
        }
    }

    fn started() -> Workspace {
        let (ws, _) = transition(workspace(), &OrchestratorEvent::Init, &interactive()).unwrap();
        ws
    }

    #[test]
    fn test_init_runs_first_phase() {
        let (ws, action) =
            transition(workspace(), &OrchestratorEvent::Init, &interactive()).unwrap();
        assert_eq!(ws.status(), RunStatus::Running);
        assert_eq!(
            action,
            Action::RunPhase {
                index: 0,
                role: Role::White
            }
        );
        assert_eq!(ws.events().last().unwrap().event_type, EventType::RunStarted);
    }

    #[test]
    fn test_phases_advance_then_complete() {
        let ws = started();
        let (ws, action) =
            transition(ws, &OrchestratorEvent::PhaseCommitted, &interactive()).unwrap();
        assert_eq!(
            action,
            Action::RunPhase {
                index: 1,
                role: Role::Black
            }
        );
        let (ws, action) =
            transition(ws, &OrchestratorEvent::PhaseCommitted, &interactive()).unwrap();
        assert_eq!(action, Action::Finish);
        assert_eq!(ws.status(), RunStatus::Completed);
        assert_eq!(ws.run().cursor, 2);
        assert_eq!(ws.audit().events_of(EventType::PhaseCompleted).count(), 2);
        assert!(ws.validate().is_ok());
    }

    #[test]
    fn test_critical_failure_suspends_interactive() {
        let (ws, action) = transition(started(), &critical(), &interactive()).unwrap();
        assert_eq!(action, Action::AwaitHuman);
        assert_eq!(ws.status(), RunStatus::WaitingForHuman);
        let suspension = ws.run().suspension.as_ref().unwrap();
        assert_eq!(suspension.role, Role::White);
        assert_eq!(suspension.kind, CriticalKind::AllAgentsFailed);
        assert!(ws.validate().is_ok());
    }

    #[test]
    fn test_critical_failure_detached() {
        let policy = HilPolicy::default().with_mode(HilMode::Detached);
        let (ws, action) = transition(started(), &critical(), &policy).unwrap();
        assert_eq!(action, Action::Detach);
        assert_eq!(ws.status(), RunStatus::WaitingForHuman);
    }

    #[test]
    fn test_critical_failure_without_human_path_fails() {
        let policy = HilPolicy::default().with_mode(HilMode::AutoFail);
        let (ws, action) = transition(started(), &critical(), &policy).unwrap();
        assert!(matches!(action, Action::DeadLetter { .. }));
        assert_eq!(ws.status(), RunStatus::Failed);
        assert!(ws.run().suspension.is_none());
    }

    #[test]
    fn test_resume_retry_reenters_same_phase() {
        let (ws, _) = transition(started(), &critical(), &interactive()).unwrap();
        let (ws, action) = transition(
            ws,
            &OrchestratorEvent::Resume(ResumeSignal::retry()),
            &interactive(),
        )
        .unwrap();
        assert_eq!(
            action,
            Action::RunPhase {
                index: 0,
                role: Role::White
            }
        );
        assert_eq!(ws.status(), RunStatus::Running);
        assert!(ws.run().suspension.is_none());
    }

    #[test]
    fn test_resume_skip_advances() {
        let (ws, _) = transition(started(), &critical(), &interactive()).unwrap();
        let (ws, action) = transition(
            ws,
            &OrchestratorEvent::Resume(ResumeSignal::skip().with_note("facts later")),
            &interactive(),
        )
        .unwrap();
        assert_eq!(
            action,
            Action::RunPhase {
                index: 1,
                role: Role::Black
            }
        );
        let skipped: Vec<_> = ws.audit().events_of(EventType::PhaseSkipped).collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].role, Some(Role::White));
    }

    #[test]
    fn test_skip_of_last_phase_completes() {
        let (ws, _) = transition(started(), &OrchestratorEvent::PhaseCommitted, &interactive())
            .unwrap();
        let (ws, _) = transition(ws, &critical(), &interactive()).unwrap();
        let (ws, action) = transition(
            ws,
            &OrchestratorEvent::Resume(ResumeSignal::skip()),
            &interactive(),
        )
        .unwrap();
        assert_eq!(action, Action::Finish);
        assert_eq!(ws.status(), RunStatus::Completed);
    }

    #[test]
    fn test_resume_abort_fails() {
        let (ws, _) = transition(started(), &critical(), &interactive()).unwrap();
        let (ws, action) = transition(
            ws,
            &OrchestratorEvent::Resume(ResumeSignal::abort().with_note("budget cut")),
            &interactive(),
        )
        .unwrap();
        match action {
            Action::DeadLetter { reason } => assert!(reason.contains("budget cut")),
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(ws.status(), RunStatus::Failed);
    }

    #[test]
    fn test_resume_timeout_fails() {
        let (ws, _) = transition(started(), &critical(), &interactive()).unwrap();
        let (ws, action) =
            transition(ws, &OrchestratorEvent::ResumeTimedOut, &interactive()).unwrap();
        assert!(matches!(action, Action::DeadLetter { .. }));
        assert_eq!(ws.status(), RunStatus::Failed);
        assert!(ws.validate().is_ok());
    }

    #[test]
    fn test_terminal_is_final() {
        let policy = HilPolicy::default().with_mode(HilMode::AutoFail);
        let (ws, _) = transition(started(), &critical(), &policy).unwrap();
        let err = transition(ws, &OrchestratorEvent::Init, &policy).unwrap_err();
        assert_eq!(err, DomainError::RunTerminal(RunStatus::Failed));
    }

    #[test]
    fn test_invalid_transitions() {
        let err = transition(
            workspace(),
            &OrchestratorEvent::PhaseCommitted,
            &interactive(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        let err = transition(
            started(),
            &OrchestratorEvent::Resume(ResumeSignal::retry()),
            &interactive(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: RunStatus::Running,
                ..
            }
        ));
    }
}
