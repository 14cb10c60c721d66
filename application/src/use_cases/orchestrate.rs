//! Orchestrate use case
//!
//! Drives a run through its phases. The lifecycle rules live in the pure
//! domain state machine ([`transition`]); this driver executes the
//! [`Action`]s it returns:
//!
//! ```text
//! event ─▶ transition ─▶ emit new events ─▶ save ─▶ action
//!   ▲                                                 │
//!   └──── PhaseCommitted / CriticalFailure / Resume ◀─┘
//! ```
//!
//! Per phase: run the agents, append their contributions, aggregate, attach
//! the synthesis, then let the state machine append `PHASE_COMPLETED`. The
//! save that follows is always the last step of a transition, so a crash
//! loses at most the phase in flight.

use super::aggregate::Aggregator;
use super::run_phase::{PhaseError, PhaseRequest, PhaseRunner};
use crate::config::OrchestratorConfig;
use crate::ports::agent::{AgentPort, PhaseContext};
use crate::ports::audit_sink::{AuditSink, NoAuditSink};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::record_store::{DeadLetter, RecordStore, RunSummary, StoreError};
use crate::ports::reducer::ReductionPort;
use crate::ports::resume_signal::{NoResumeSignal, ResumeSignalPort};
use chrono::Utc;
use serde_json::json;
use sixhats_domain::{
    Action, ActionItem, AgentInfo, Artifact, AuditEvent, Contribution, CriticalKind, Decision,
    DomainError, EventType, HilPolicy, OpenQuestion, OrchestratorEvent, ProtocolDefinition,
    ResumeSignal, Role, RunId, RunStatus, Scenario, Workspace, transition,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Errors that can occur during orchestration
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("Run {run_id} is {status}; {operation} needs {expected}")]
    UnexpectedStatus {
        run_id: RunId,
        status: RunStatus,
        operation: &'static str,
        expected: &'static str,
    },
}

impl OrchestratorError {
    /// Check if the run state itself is in doubt
    pub fn is_critical(&self) -> bool {
        match self {
            OrchestratorError::Store(e) => e.is_critical(),
            OrchestratorError::Domain(e) => e.is_corruption(),
            _ => false,
        }
    }
}

/// How a call into the orchestrator ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Every phase ran
    Completed(Workspace),
    /// Waiting for a human; resume with [`Orchestrator::resume`]
    Suspended(Workspace),
    /// Failed and dead-lettered
    Failed { workspace: Workspace, reason: String },
    /// Stopped by cancellation; continue with [`Orchestrator::continue_run`]
    Cancelled(Workspace),
}

impl RunOutcome {
    pub fn workspace(&self) -> &Workspace {
        match self {
            RunOutcome::Completed(ws)
            | RunOutcome::Suspended(ws)
            | RunOutcome::Cancelled(ws)
            | RunOutcome::Failed { workspace: ws, .. } => ws,
        }
    }

    pub fn into_workspace(self) -> Workspace {
        match self {
            RunOutcome::Completed(ws)
            | RunOutcome::Suspended(ws)
            | RunOutcome::Cancelled(ws)
            | RunOutcome::Failed { workspace: ws, .. } => ws,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Completed(_) => "completed",
            RunOutcome::Suspended(_) => "suspended",
            RunOutcome::Failed { .. } => "failed",
            RunOutcome::Cancelled(_) => "cancelled",
        }
    }
}

/// Where the driver loop starts
enum Next {
    Event(OrchestratorEvent),
    Act(Action),
}

/// Result of executing one phase
enum PhaseStep {
    Committed,
    Critical { kind: CriticalKind, message: String },
    Cancelled,
}

/// Use case for driving runs
pub struct Orchestrator {
    protocol: ProtocolDefinition,
    agent: Arc<dyn AgentPort>,
    reducer: Arc<dyn ReductionPort>,
    store: Arc<dyn RecordStore>,
    resume: Arc<dyn ResumeSignalPort>,
    audit: Arc<dyn AuditSink>,
    progress: Arc<dyn ProgressNotifier>,
    config: OrchestratorConfig,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        protocol: ProtocolDefinition,
        agent: Arc<dyn AgentPort>,
        reducer: Arc<dyn ReductionPort>,
        store: Arc<dyn RecordStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            protocol,
            agent,
            reducer,
            store,
            resume: Arc::new(NoResumeSignal),
            audit: Arc::new(NoAuditSink),
            progress: Arc::new(NoProgress),
            config,
            cancel: CancellationToken::new(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_resume_signal(mut self, resume: Arc<dyn ResumeSignalPort>) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn protocol(&self) -> &ProtocolDefinition {
        &self.protocol
    }

    fn policy(&self) -> &HilPolicy {
        &self.config.hil
    }

    // ==================== Run lifecycle ====================

    /// Create a run for `scenario` and drive it
    pub async fn execute(&self, scenario: Scenario) -> Result<RunOutcome, OrchestratorError> {
        let workspace = Workspace::new(scenario, &self.protocol)?;
        self.start(workspace).await
    }

    /// Drive a freshly created (PENDING) workspace
    pub async fn start(&self, workspace: Workspace) -> Result<RunOutcome, OrchestratorError> {
        if workspace.status() != RunStatus::Pending {
            return Err(self.unexpected(&workspace, "start", "pending"));
        }
        workspace.check_protocol(&self.protocol)?;
        info!(
            run_id = %workspace.run_id(),
            protocol = %workspace.run().protocol,
            "Starting run '{}'",
            workspace.scenario().title
        );
        self.store.save(&workspace).await?;
        self.drive(workspace, Next::Event(OrchestratorEvent::Init), 0)
            .await
    }

    /// Answer a suspended run.
    ///
    /// A signal that arrives after the resume timeout is not applied; the
    /// run is failed and dead-lettered as if nobody had answered.
    pub async fn resume(
        &self,
        run_id: &RunId,
        signal: ResumeSignal,
    ) -> Result<RunOutcome, OrchestratorError> {
        let workspace = self.load_for_protocol(run_id).await?;
        if workspace.status() != RunStatus::WaitingForHuman {
            return Err(self.unexpected(&workspace, "resume", "waiting_for_human"));
        }
        let timeout = self.policy().resume_timeout;
        let expired = workspace
            .run()
            .suspension
            .as_ref()
            .is_some_and(|s| s.is_expired(timeout, Utc::now()));
        let event = if expired {
            warn!(
                run_id = %run_id,
                action = %signal.action,
                "Resume signal arrived after {:?}; failing the run",
                timeout
            );
            OrchestratorEvent::ResumeTimedOut
        } else {
            info!(run_id = %run_id, action = %signal.action, "Resuming run");
            OrchestratorEvent::Resume(signal)
        };
        let emitted = workspace.events().len();
        self.drive(workspace, Next::Event(event), emitted).await
    }

    /// Re-enter a run that stopped without reaching a resting state
    /// (crash or cancellation) at its cursor
    pub async fn continue_run(&self, run_id: &RunId) -> Result<RunOutcome, OrchestratorError> {
        let workspace = self.load_for_protocol(run_id).await?;
        let emitted = workspace.events().len();
        match workspace.status() {
            RunStatus::Pending => {
                self.drive(workspace, Next::Event(OrchestratorEvent::Init), emitted)
                    .await
            }
            RunStatus::Running => {
                let index = workspace.run().cursor;
                let role = workspace
                    .phase_at(index)
                    .map(|p| p.role().clone())
                    .ok_or_else(|| {
                        DomainError::InvariantViolation(format!("no phase at cursor {index}"))
                    })?;
                info!(run_id = %run_id, role = %role, "Continuing run at phase {}", index);
                self.drive(workspace, Next::Act(Action::RunPhase { index, role }), emitted)
                    .await
            }
            RunStatus::WaitingForHuman => {
                Err(self.unexpected(&workspace, "continue", "running or pending"))
            }
            status => Err(DomainError::RunTerminal(status).into()),
        }
    }

    // ==================== Human input ====================

    /// Append a human-authored contribution to `role`'s phase
    pub async fn record_human_contribution(
        &self,
        run_id: &RunId,
        role: &Role,
        actor: &str,
        content: &str,
    ) -> Result<Contribution, OrchestratorError> {
        let mut workspace = self.load_for_human_input(run_id, "contribute").await?;
        let before = workspace.events().len();

        let contribution = Contribution::new(role.clone(), AgentInfo::human(actor), content);
        workspace.append_contribution(contribution.clone())?;
        workspace.append_event(
            AuditEvent::new(EventType::HumanInput, actor)
                .with_role(role.clone())
                .with_data(json!({ "contribution_id": contribution.contribution_id })),
        )?;

        self.store.save(&workspace).await?;
        self.emit_from(&workspace, before);
        info!(run_id = %run_id, role = %role, actor, "Recorded human contribution");
        Ok(contribution)
    }

    pub async fn record_decision(
        &self,
        run_id: &RunId,
        decision: Decision,
    ) -> Result<Workspace, OrchestratorError> {
        let actor = decision.made_by.clone();
        self.record_artifact(run_id, Artifact::Decision(decision), &actor)
            .await
    }

    pub async fn record_action_item(
        &self,
        run_id: &RunId,
        item: ActionItem,
        actor: &str,
    ) -> Result<Workspace, OrchestratorError> {
        self.record_artifact(run_id, Artifact::ActionItem(item), actor)
            .await
    }

    pub async fn record_open_question(
        &self,
        run_id: &RunId,
        question: OpenQuestion,
        actor: &str,
    ) -> Result<Workspace, OrchestratorError> {
        self.record_artifact(run_id, Artifact::OpenQuestion(question), actor)
            .await
    }

    pub async fn record_global_summary(
        &self,
        run_id: &RunId,
        summary: &str,
        actor: &str,
    ) -> Result<Workspace, OrchestratorError> {
        let mut workspace = self.load_for_human_input(run_id, "summarise").await?;
        let before = workspace.events().len();
        workspace.set_global_summary(summary)?;
        workspace.append_event(
            AuditEvent::new(EventType::ArtifactRecorded, actor)
                .with_data(json!({ "kind": "global_summary" })),
        )?;
        self.store.save(&workspace).await?;
        self.emit_from(&workspace, before);
        Ok(workspace)
    }

    async fn record_artifact(
        &self,
        run_id: &RunId,
        artifact: Artifact,
        actor: &str,
    ) -> Result<Workspace, OrchestratorError> {
        let mut workspace = self.load_for_human_input(run_id, "record an artifact").await?;
        let before = workspace.events().len();
        let data = json!({
            "kind": artifact.kind(),
            "artifact_id": artifact.id(),
            "based_on": artifact.based_on(),
        });
        workspace.record_artifact(artifact)?;
        workspace.append_event(AuditEvent::new(EventType::ArtifactRecorded, actor).with_data(data))?;
        self.store.save(&workspace).await?;
        self.emit_from(&workspace, before);
        Ok(workspace)
    }

    // ==================== Queries ====================

    pub async fn load(&self, run_id: &RunId) -> Result<Workspace, OrchestratorError> {
        Ok(self.store.load(run_id).await?)
    }

    pub async fn list_runs(&self) -> Result<Vec<RunSummary>, OrchestratorError> {
        Ok(self.store.list_runs().await?)
    }

    pub async fn dead_letter_of(
        &self,
        run_id: &RunId,
    ) -> Result<Option<DeadLetter>, OrchestratorError> {
        Ok(self.store.load_dead_letter(run_id).await?)
    }

    // ==================== Driver ====================

    /// Feed events through the state machine until the run rests.
    ///
    /// `emitted` is how many of the workspace's events the audit sink has
    /// already seen.
    async fn drive(
        &self,
        mut workspace: Workspace,
        start: Next,
        mut emitted: usize,
    ) -> Result<RunOutcome, OrchestratorError> {
        let mut next = start;
        let mut save_failed = false;

        loop {
            let action = match next {
                Next::Act(action) => action,
                Next::Event(event) => {
                    let (updated, action) = transition(workspace, &event, self.policy())?;
                    workspace = updated;
                    self.emit_since(&workspace, &mut emitted);

                    if let Err(e) = self.store.save(&workspace).await {
                        error!(run_id = %workspace.run_id(), "Checkpoint failed: {}", e);
                        if workspace.status() == RunStatus::Running && !save_failed {
                            save_failed = true;
                            next = Next::Event(OrchestratorEvent::CriticalFailure {
                                kind: CriticalKind::StoreUnavailable,
                                message: e.to_string(),
                            });
                            continue;
                        }
                        return Err(e.into());
                    }
                    save_failed = false;
                    action
                }
            };

            next = match action {
                Action::RunPhase { index, role } => {
                    match self
                        .execute_phase(&mut workspace, index, &role, &mut emitted)
                        .await?
                    {
                        PhaseStep::Committed => Next::Event(OrchestratorEvent::PhaseCommitted),
                        PhaseStep::Critical { kind, message } => {
                            warn!(run_id = %workspace.run_id(), role = %role, "Critical failure: {}", message);
                            Next::Event(OrchestratorEvent::CriticalFailure { kind, message })
                        }
                        PhaseStep::Cancelled => {
                            return self.checkpoint_cancelled(workspace, &role, emitted).await;
                        }
                    }
                }
                Action::AwaitHuman => {
                    let suspension = workspace.run().suspension.clone().ok_or_else(|| {
                        DomainError::InvariantViolation(
                            "waiting for human without a suspension record".to_string(),
                        )
                    })?;
                    self.progress.on_suspended(&suspension);
                    info!(
                        run_id = %workspace.run_id(),
                        role = %suspension.role,
                        "Waiting up to {:?} for a resume signal",
                        self.policy().resume_timeout
                    );

                    let waited = tokio::select! {
                        _ = self.cancel.cancelled() => None,
                        answer = tokio::time::timeout(
                            self.policy().resume_timeout,
                            self.resume.wait_for_signal(&workspace, &suspension),
                        ) => Some(answer),
                    };
                    match waited {
                        None => return Ok(RunOutcome::Suspended(workspace)),
                        Some(Ok(Ok(signal))) => Next::Event(OrchestratorEvent::Resume(signal)),
                        Some(Ok(Err(e))) => {
                            warn!(run_id = %workspace.run_id(), "No resume signal ({}); run stays suspended", e);
                            return Ok(RunOutcome::Suspended(workspace));
                        }
                        Some(Err(_)) => {
                            warn!(run_id = %workspace.run_id(), "Resume timed out");
                            Next::Event(OrchestratorEvent::ResumeTimedOut)
                        }
                    }
                }
                Action::Detach => {
                    if let Some(suspension) = &workspace.run().suspension {
                        self.progress.on_suspended(suspension);
                    }
                    info!(run_id = %workspace.run_id(), "Run suspended; awaiting an external resume");
                    return Ok(RunOutcome::Suspended(workspace));
                }
                Action::DeadLetter { reason } => {
                    self.dead_letter(&workspace, &reason).await?;
                    return Ok(RunOutcome::Failed { workspace, reason });
                }
                Action::Finish => {
                    info!(
                        run_id = %workspace.run_id(),
                        "Run completed with {} contributions",
                        workspace.contribution_count()
                    );
                    return Ok(RunOutcome::Completed(workspace));
                }
            };
        }
    }

    async fn execute_phase(
        &self,
        workspace: &mut Workspace,
        index: usize,
        role: &Role,
        emitted: &mut usize,
    ) -> Result<PhaseStep, OrchestratorError> {
        if self.cancel.is_cancelled() {
            return Ok(PhaseStep::Cancelled);
        }

        let agents = self
            .protocol
            .agents_for(role)
            .map(<[AgentInfo]>::to_vec)
            .unwrap_or_default();
        workspace.append_event(
            AuditEvent::new(EventType::PhaseStarted, "orchestrator")
                .with_role(role.clone())
                .with_data(json!({ "index": index, "agents": agents.len() })),
        )?;
        self.emit_since(workspace, emitted);
        self.progress.on_phase_start(index, role, agents.len());

        let context = PhaseContext {
            run_id: workspace.run_id().clone(),
            phase_index: index,
            prior_syntheses: workspace
                .phases()
                .iter()
                .take(index)
                .filter_map(|p| p.synthesis().cloned())
                .collect(),
        };
        let request = PhaseRequest {
            role: role.clone(),
            agents,
            scenario: Arc::new(workspace.scenario().clone()),
            context: Arc::new(context),
        };
        let result = self
            .runner()
            .run(request, Arc::clone(&self.progress), &self.cancel)
            .await?;

        // runner events were emitted as they happened
        if let Err(e) = absorb(workspace, &result, emitted) {
            return Ok(invariant(e));
        }

        if result.cancelled {
            return Ok(PhaseStep::Cancelled);
        }
        if let Err(e) = result.check() {
            return Ok(PhaseStep::Critical {
                kind: CriticalKind::AllAgentsFailed,
                message: e.to_string(),
            });
        }

        let raw = workspace
            .phase(role)
            .map(|p| p.raw().to_vec())
            .unwrap_or_default();
        let aggregated = self
            .aggregator()
            .aggregate(workspace.run_id(), role, workspace.scenario(), &raw)
            .await;
        let fallback = aggregated.synthesis.is_fallback();
        let attached = workspace
            .attach_synthesis(aggregated.synthesis)
            .and_then(|_| workspace.append_event(aggregated.event));
        if let Err(e) = attached {
            return Ok(invariant(e));
        }
        *emitted = workspace.events().len();

        self.progress.on_phase_complete(role, fallback);
        Ok(PhaseStep::Committed)
    }

    async fn checkpoint_cancelled(
        &self,
        mut workspace: Workspace,
        role: &Role,
        mut emitted: usize,
    ) -> Result<RunOutcome, OrchestratorError> {
        let collected = workspace.phase(role).map(|p| p.raw().len()).unwrap_or(0);
        workspace.append_event(
            AuditEvent::new(EventType::RunCancelled, "orchestrator")
                .with_role(role.clone())
                .with_data(json!({ "cursor": workspace.run().cursor, "collected": collected })),
        )?;
        self.emit_since(&workspace, &mut emitted);
        self.store.save(&workspace).await?;
        warn!(run_id = %workspace.run_id(), role = %role, "Run cancelled; {} contributions kept", collected);
        Ok(RunOutcome::Cancelled(workspace))
    }

    /// Write the dead letter, retrying once. The alert fires either way; a
    /// second write failure is returned so a FAILED run never goes
    /// unreported without its snapshot.
    async fn dead_letter(&self, workspace: &Workspace, reason: &str) -> Result<(), StoreError> {
        let run_id = workspace.run_id();
        let mut written = self.store.dead_letter(workspace, reason).await;
        if let Err(e) = &written {
            warn!(run_id = %run_id, "Dead letter write failed, retrying: {}", e);
            written = self.store.dead_letter(workspace, reason).await;
        }

        let event = AuditEvent::new(EventType::RunDeadLettered, "orchestrator")
            .with_data(json!({ "reason": reason, "written": written.is_ok() }));
        self.audit.emit(run_id, &event);
        match &written {
            Ok(()) => {
                self.audit.alert(run_id, reason);
                error!(run_id = %run_id, "Run failed and was dead-lettered: {}", reason);
            }
            Err(e) => {
                self.audit
                    .alert(run_id, &format!("{reason} (dead letter not written: {e})"));
                error!(run_id = %run_id, "Run failed; dead letter could not be written: {}", e);
            }
        }
        written
    }

    // ==================== Helpers ====================

    fn runner(&self) -> PhaseRunner {
        PhaseRunner::new(
            Arc::clone(&self.agent),
            self.config.retry.clone(),
            self.config.agent_timeout,
            Arc::clone(&self.audit),
        )
    }

    fn aggregator(&self) -> Aggregator {
        Aggregator::new(
            Arc::clone(&self.reducer),
            Arc::clone(&self.audit),
            self.config.fallback_key_points,
            self.config.aggregation_timeout,
        )
    }

    async fn load_for_protocol(&self, run_id: &RunId) -> Result<Workspace, OrchestratorError> {
        let workspace = self.store.load(run_id).await?;
        workspace.check_protocol(&self.protocol)?;
        Ok(workspace)
    }

    /// Load a run for a human write. A RUNNING run is owned by the process
    /// driving it, whose next checkpoint overwrites the whole record, so
    /// it is refused. Terminal runs are rejected by the workspace itself.
    async fn load_for_human_input(
        &self,
        run_id: &RunId,
        operation: &'static str,
    ) -> Result<Workspace, OrchestratorError> {
        let workspace = self.load_for_protocol(run_id).await?;
        if workspace.status() == RunStatus::Running {
            return Err(self.unexpected(&workspace, operation, "pending or waiting_for_human"));
        }
        Ok(workspace)
    }

    fn emit_since(&self, workspace: &Workspace, emitted: &mut usize) {
        self.emit_from(workspace, *emitted);
        *emitted = workspace.events().len();
    }

    fn emit_from(&self, workspace: &Workspace, from: usize) {
        for event in workspace.events().iter().skip(from) {
            self.audit.emit(workspace.run_id(), event);
        }
    }

    fn unexpected(
        &self,
        workspace: &Workspace,
        operation: &'static str,
        expected: &'static str,
    ) -> OrchestratorError {
        OrchestratorError::UnexpectedStatus {
            run_id: workspace.run_id().clone(),
            status: workspace.status(),
            operation,
            expected,
        }
    }
}

/// Append a phase result to the workspace.
///
/// The runner already emitted its events, so `emitted` moves past whatever
/// was appended even when appending stops partway.
fn absorb(
    workspace: &mut Workspace,
    result: &super::run_phase::PhaseResult,
    emitted: &mut usize,
) -> Result<(), DomainError> {
    let appended = append_result(workspace, result);
    *emitted = workspace.events().len();
    appended
}

fn append_result(
    workspace: &mut Workspace,
    result: &super::run_phase::PhaseResult,
) -> Result<(), DomainError> {
    for contribution in &result.contributions {
        workspace.append_contribution(contribution.clone())?;
    }
    for event in &result.events {
        workspace.append_event(event.clone())?;
    }
    workspace.record_agent_calls(result.agent_calls)
}

fn invariant(e: DomainError) -> PhaseStep {
    PhaseStep::Critical {
        kind: CriticalKind::InvariantViolation,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::agent::AgentError;
    use crate::ports::audit_sink::testing::RecordingSink;
    use crate::ports::record_store::MemoryRecordStore;
    use crate::ports::resume_signal::{ResumeSignalError, ScriptedResumeSignal};
    use crate::use_cases::test_support::{ScriptedAgent, ScriptedReducer, Step, protocol, scenario};
    use async_trait::async_trait;
    use sixhats_domain::{FALLBACK_MARKER, HilMode, Suspension};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn three_roles() -> ProtocolDefinition {
        protocol(&[Role::White, Role::Black, Role::Green], 2)
    }

    struct Fixture {
        agent: Arc<ScriptedAgent>,
        store: Arc<MemoryRecordStore>,
        sink: Arc<RecordingSink>,
    }

    impl Fixture {
        fn new(agent: ScriptedAgent) -> Self {
            Self {
                agent: Arc::new(agent),
                store: Arc::new(MemoryRecordStore::new()),
                sink: Arc::new(RecordingSink::default()),
            }
        }

        fn orchestrator(&self, reducer: ScriptedReducer, mode: HilMode) -> Orchestrator {
            let config = OrchestratorConfig::default()
                .with_hil_mode(mode)
                .with_resume_timeout(Duration::from_secs(30));
            Orchestrator::new(
                three_roles(),
                Arc::clone(&self.agent) as Arc<dyn AgentPort>,
                Arc::new(reducer),
                Arc::clone(&self.store) as Arc<dyn RecordStore>,
                config,
            )
            .with_audit_sink(Arc::clone(&self.sink) as Arc<dyn AuditSink>)
        }
    }

    #[tokio::test]
    async fn test_happy_path_completes() {
        let fx = Fixture::new(ScriptedAgent::new());
        let outcome = fx
            .orchestrator(ScriptedReducer::new(), HilMode::Interactive)
            .execute(scenario())
            .await
            .unwrap();

        let RunOutcome::Completed(ws) = outcome else {
            panic!("expected completion, got {}", outcome.label());
        };
        assert_eq!(ws.status(), RunStatus::Completed);
        assert_eq!(ws.contribution_count(), 6);
        for phase in ws.phases() {
            assert_eq!(phase.raw().len(), 2);
            assert!(!phase.synthesis().unwrap().is_fallback());
        }
        assert_eq!(ws.metrics().agent_call_count, 6);
        assert_eq!(ws.metrics().aggregation_call_count, 3);

        let stored = fx.store.load(ws.run_id()).await.unwrap();
        assert_eq!(stored, ws);

        // the sink saw exactly the workspace audit log
        let events = ws.events().iter().map(|e| e.event_type).collect::<Vec<_>>();
        assert_eq!(fx.sink.types(), events);
        assert_eq!(events.first(), Some(&EventType::RunCreated));
        assert_eq!(events.last(), Some(&EventType::RunCompleted));
    }

    #[tokio::test]
    async fn test_later_phases_see_prior_syntheses() {
        struct ContextRecorder(std::sync::Mutex<Vec<usize>>);

        #[async_trait]
        impl AgentPort for ContextRecorder {
            async fn invoke(
                &self,
                _role: &Role,
                _agent: &AgentInfo,
                _scenario: &Scenario,
                context: &PhaseContext,
            ) -> Result<sixhats_domain::ContributionDraft, AgentError> {
                self.0.lock().unwrap().push(context.prior_syntheses.len());
                Ok(sixhats_domain::ContributionDraft::new("ok"))
            }
        }

        let recorder = Arc::new(ContextRecorder(Default::default()));
        let orchestrator = Orchestrator::new(
            protocol(&[Role::White, Role::Black, Role::Green], 1),
            Arc::clone(&recorder) as Arc<dyn AgentPort>,
            Arc::new(ScriptedReducer::new()),
            Arc::new(MemoryRecordStore::new()),
            OrchestratorConfig::default(),
        );
        orchestrator.execute(scenario()).await.unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_partial_failure_continues() {
        let fx = Fixture::new(
            ScriptedAgent::new()
                .script("black-agent-0", vec![Step::Fail(AgentError::Malformed("x".into()))]),
        );
        let ws = fx
            .orchestrator(ScriptedReducer::new(), HilMode::AutoFail)
            .execute(scenario())
            .await
            .unwrap()
            .into_workspace();

        assert_eq!(ws.status(), RunStatus::Completed);
        assert_eq!(ws.phase(&Role::Black).unwrap().raw().len(), 1);
        assert_eq!(ws.audit().events_of(EventType::AgentFailed).count(), 1);
    }

    #[tokio::test]
    async fn test_aggregation_fallback_still_completes() {
        let fx = Fixture::new(ScriptedAgent::new());
        let ws = fx
            .orchestrator(ScriptedReducer::failing(), HilMode::AutoFail)
            .execute(scenario())
            .await
            .unwrap()
            .into_workspace();

        assert_eq!(ws.status(), RunStatus::Completed);
        for phase in ws.phases() {
            let synthesis = phase.synthesis().unwrap();
            assert!(synthesis.summary.starts_with(FALLBACK_MARKER));
            assert_eq!(synthesis.confidence, 0.0);
            assert!(synthesis.key_points.len() <= 5);
        }
        assert_eq!(ws.audit().events_of(EventType::AggregationFallback).count(), 3);
    }

    #[tokio::test]
    async fn test_all_fail_without_human_path_dead_letters() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::Black, AgentError::Validation("bad".into())),
        );
        let outcome = fx
            .orchestrator(ScriptedReducer::new(), HilMode::AutoFail)
            .execute(scenario())
            .await
            .unwrap();

        let RunOutcome::Failed { workspace, reason } = outcome else {
            panic!("expected failure");
        };
        assert!(reason.contains("all_agents_failed"));
        assert_eq!(workspace.status(), RunStatus::Failed);
        assert_eq!(workspace.run().cursor, 1);
        // white phase kept, green never ran
        assert!(workspace.phase(&Role::White).unwrap().synthesis().is_some());
        assert!(workspace.phase(&Role::Green).unwrap().raw().is_empty());

        let letter = fx
            .store
            .load_dead_letter(workspace.run_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(letter.workspace.status(), RunStatus::Failed);
        assert_eq!(fx.sink.alert_count(), 1);
        assert!(fx.sink.types().contains(&EventType::RunDeadLettered));
        assert_eq!(
            fx.store.load(workspace.run_id()).await.unwrap().status(),
            RunStatus::Failed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_suspend_then_retry_preserves_earlier_phases() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::Black, AgentError::Unavailable("down".into())),
        );
        let orchestrator = fx.orchestrator(ScriptedReducer::new(), HilMode::Detached);

        let outcome = orchestrator.execute(scenario()).await.unwrap();
        let RunOutcome::Suspended(suspended) = outcome else {
            panic!("expected suspension");
        };
        let run_id = suspended.run_id().clone();
        let stored = fx.store.load(&run_id).await.unwrap();
        assert_eq!(stored.status(), RunStatus::WaitingForHuman);
        let suspension = stored.run().suspension.clone().unwrap();
        assert_eq!(suspension.role, Role::Black);
        assert_eq!(suspension.kind, CriticalKind::AllAgentsFailed);
        let white_before = serde_json::to_string(&stored.phases()[0]).unwrap();

        fx.agent.heal(&Role::Black);
        let outcome = orchestrator
            .resume(&run_id, ResumeSignal::retry().with_note("provider back"))
            .await
            .unwrap();
        let ws = outcome.into_workspace();
        assert_eq!(ws.status(), RunStatus::Completed);
        assert_eq!(serde_json::to_string(&ws.phases()[0]).unwrap(), white_before);
        assert_eq!(ws.phase(&Role::Black).unwrap().raw().len(), 2);
        assert_eq!(ws.audit().events_of(EventType::RunResumed).count(), 1);
        assert!(ws.validate().is_ok());
    }

    #[tokio::test]
    async fn test_detached_skip_advances() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::White, AgentError::Malformed("x".into())),
        );
        let orchestrator = fx.orchestrator(ScriptedReducer::new(), HilMode::Detached);
        let run_id = orchestrator
            .execute(scenario())
            .await
            .unwrap()
            .workspace()
            .run_id()
            .clone();

        let ws = orchestrator
            .resume(&run_id, ResumeSignal::skip())
            .await
            .unwrap()
            .into_workspace();
        assert_eq!(ws.status(), RunStatus::Completed);
        assert!(ws.phase(&Role::White).unwrap().synthesis().is_none());
        assert!(ws.phase(&Role::Green).unwrap().synthesis().is_some());
        assert_eq!(ws.audit().events_of(EventType::PhaseSkipped).count(), 1);
    }

    #[tokio::test]
    async fn test_interactive_abort_fails() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::Green, AgentError::Malformed("x".into())),
        );
        let orchestrator = fx
            .orchestrator(ScriptedReducer::new(), HilMode::Interactive)
            .with_resume_signal(Arc::new(ScriptedResumeSignal::new([
                ResumeSignal::abort().with_note("out of budget"),
            ])));
        let outcome = orchestrator.execute(scenario()).await.unwrap();
        let RunOutcome::Failed { workspace, reason } = outcome else {
            panic!("expected failure");
        };
        assert!(reason.contains("out of budget"));
        assert_eq!(workspace.run().cursor, 2);
        assert!(fx
            .store
            .load_dead_letter(workspace.run_id())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_interactive_retry_through_port() {
        struct HealThenRetry(Arc<ScriptedAgent>);

        #[async_trait]
        impl ResumeSignalPort for HealThenRetry {
            async fn wait_for_signal(
                &self,
                workspace: &Workspace,
                suspension: &Suspension,
            ) -> Result<ResumeSignal, ResumeSignalError> {
                assert_eq!(workspace.status(), RunStatus::WaitingForHuman);
                self.0.heal(&suspension.role);
                Ok(ResumeSignal::retry())
            }
        }

        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::White, AgentError::Malformed("x".into())),
        );
        let orchestrator = fx
            .orchestrator(ScriptedReducer::new(), HilMode::Interactive)
            .with_resume_signal(Arc::new(HealThenRetry(Arc::clone(&fx.agent))));
        let ws = orchestrator
            .execute(scenario())
            .await
            .unwrap()
            .into_workspace();
        assert_eq!(ws.status(), RunStatus::Completed);
        // failed attempt's audit kept alongside the retry
        assert_eq!(ws.audit().events_of(EventType::AgentFailed).count(), 2);
        assert_eq!(ws.audit().events_of(EventType::RunSuspended).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_timeout_dead_letters() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::White, AgentError::Malformed("x".into())),
        );
        let outcome = fx
            .orchestrator(ScriptedReducer::new(), HilMode::Interactive)
            .execute(scenario())
            .await
            .unwrap();
        let RunOutcome::Failed { workspace, reason } = outcome else {
            panic!("expected failure");
        };
        assert!(reason.contains("no resume signal within 30s"));
        assert!(workspace.run().suspension.is_none());
        assert_eq!(fx.sink.alert_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_requires_suspension() {
        let fx = Fixture::new(ScriptedAgent::new());
        let orchestrator = fx.orchestrator(ScriptedReducer::new(), HilMode::Detached);
        let ws = orchestrator
            .execute(scenario())
            .await
            .unwrap()
            .into_workspace();
        let err = orchestrator
            .resume(ws.run_id(), ResumeSignal::retry())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::UnexpectedStatus {
                status: RunStatus::Completed,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_then_continue() {
        let fx = Fixture::new(ScriptedAgent::new().script("black-agent-1", vec![Step::Hang]));
        let cancel = CancellationToken::new();
        let orchestrator = fx
            .orchestrator(ScriptedReducer::new(), HilMode::AutoFail)
            .with_cancellation(cancel.clone());
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let outcome = orchestrator.execute(scenario()).await.unwrap();
        let RunOutcome::Cancelled(cancelled) = outcome else {
            panic!("expected cancellation, got {}", outcome.label());
        };
        let run_id = cancelled.run_id().clone();
        let stored = fx.store.load(&run_id).await.unwrap();
        assert_eq!(stored.status(), RunStatus::Running);
        assert_eq!(stored.run().cursor, 1);
        assert_eq!(stored.phase(&Role::Black).unwrap().raw().len(), 1);
        let white_before = serde_json::to_string(&stored.phases()[0]).unwrap();

        // a fresh process continues where the first stopped
        let fresh = fx.orchestrator(ScriptedReducer::new(), HilMode::AutoFail);
        let ws = fresh.continue_run(&run_id).await.unwrap().into_workspace();
        assert_eq!(ws.status(), RunStatus::Completed);
        assert_eq!(serde_json::to_string(&ws.phases()[0]).unwrap(), white_before);
        // the contribution kept at cancellation is still there, plus two new ones
        assert_eq!(ws.phase(&Role::Black).unwrap().raw().len(), 3);
        assert_eq!(
            ws.phase(&Role::Black).unwrap().synthesis().unwrap().derived_from.len(),
            3
        );
    }

    struct FlakyStore {
        inner: MemoryRecordStore,
        saves: AtomicU32,
        fail_on: u32,
        /// Dead letter writes that fail before one succeeds
        dead_letter_failures: AtomicU32,
    }

    impl FlakyStore {
        fn new(fail_on: u32, dead_letter_failures: u32) -> Self {
            Self {
                inner: MemoryRecordStore::new(),
                saves: AtomicU32::new(0),
                fail_on,
                dead_letter_failures: AtomicU32::new(dead_letter_failures),
            }
        }
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn load(&self, run_id: &RunId) -> Result<Workspace, StoreError> {
            self.inner.load(run_id).await
        }
        async fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
            let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.save(workspace).await
        }
        async fn dead_letter(&self, workspace: &Workspace, ctx: &str) -> Result<(), StoreError> {
            let left = self.dead_letter_failures.load(Ordering::SeqCst);
            if left > 0 {
                self.dead_letter_failures.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Unavailable("dead letter bucket offline".to_string()));
            }
            self.inner.dead_letter(workspace, ctx).await
        }
        async fn load_dead_letter(
            &self,
            run_id: &RunId,
        ) -> Result<Option<DeadLetter>, StoreError> {
            self.inner.load_dead_letter(run_id).await
        }
        async fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
            self.inner.list_runs().await
        }
    }

    #[tokio::test]
    async fn test_store_outage_suspends_then_recovers() {
        // saves: 1 pending, 2 started, 3 white committed (fails)
        let store = Arc::new(FlakyStore::new(3, 0));
        let orchestrator = Orchestrator::new(
            three_roles(),
            Arc::new(ScriptedAgent::new()),
            Arc::new(ScriptedReducer::new()),
            Arc::clone(&store) as Arc<dyn RecordStore>,
            OrchestratorConfig::default().with_hil_mode(HilMode::Detached),
        );

        let outcome = orchestrator.execute(scenario()).await.unwrap();
        let RunOutcome::Suspended(ws) = outcome else {
            panic!("expected suspension");
        };
        let suspension = ws.run().suspension.clone().unwrap();
        assert_eq!(suspension.kind, CriticalKind::StoreUnavailable);
        // the white phase made it to the store with the suspension
        let stored = store.load(ws.run_id()).await.unwrap();
        assert!(stored.phase(&Role::White).unwrap().synthesis().is_some());

        let done = orchestrator
            .resume(ws.run_id(), ResumeSignal::retry())
            .await
            .unwrap()
            .into_workspace();
        assert_eq!(done.status(), RunStatus::Completed);
        assert_eq!(done.phase(&Role::White).unwrap().raw().len(), 2);
    }

    #[tokio::test]
    async fn test_human_contribution_and_artifacts() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::Green, AgentError::Malformed("x".into())),
        );
        let orchestrator = fx.orchestrator(ScriptedReducer::new(), HilMode::Detached);
        let ws = orchestrator
            .execute(scenario())
            .await
            .unwrap()
            .into_workspace();
        let run_id = ws.run_id().clone();

        let human = orchestrator
            .record_human_contribution(&run_id, &Role::Green, "alice", "Pilot it on one service")
            .await
            .unwrap();
        assert!(human.is_human());

        let black_synthesis = ws
            .phase(&Role::Black)
            .unwrap()
            .synthesis()
            .unwrap()
            .synthesis_id
            .clone();
        let ws = orchestrator
            .record_decision(
                &run_id,
                Decision::new(
                    "Pilot first",
                    "Risks are manageable at small scale",
                    "alice",
                    vec![human.contribution_id.clone(), black_synthesis],
                ),
            )
            .await
            .unwrap();
        assert_eq!(ws.artifacts().decisions.len(), 1);

        let err = orchestrator
            .record_open_question(
                &run_id,
                OpenQuestion::new("Who maintains it?", Role::Blue, vec!["missing".into()]),
                "alice",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Domain(DomainError::Provenance(_))
        ));

        let stored = fx.store.load(&run_id).await.unwrap();
        assert_eq!(stored.audit().events_of(EventType::HumanInput).count(), 1);
        assert_eq!(stored.audit().events_of(EventType::ArtifactRecorded).count(), 1);
        assert!(fx.sink.types().contains(&EventType::HumanInput));

        // skip the failed phase; afterwards the record is closed
        orchestrator
            .resume(&run_id, ResumeSignal::skip())
            .await
            .unwrap();
        let err = orchestrator
            .record_human_contribution(&run_id, &Role::Green, "bob", "late")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Domain(DomainError::RunTerminal(RunStatus::Completed))
        ));
    }

    fn auto_fail_on_black(store: Arc<FlakyStore>, sink: Arc<RecordingSink>) -> Orchestrator {
        Orchestrator::new(
            three_roles(),
            Arc::new(
                ScriptedAgent::new().fail_role(Role::Black, AgentError::Validation("bad".into())),
            ),
            Arc::new(ScriptedReducer::new()),
            store as Arc<dyn RecordStore>,
            OrchestratorConfig::default().with_hil_mode(HilMode::AutoFail),
        )
        .with_audit_sink(sink as Arc<dyn AuditSink>)
    }

    #[tokio::test]
    async fn test_dead_letter_write_is_retried() {
        let store = Arc::new(FlakyStore::new(0, 1));
        let sink = Arc::new(RecordingSink::default());
        let outcome = auto_fail_on_black(Arc::clone(&store), Arc::clone(&sink))
            .execute(scenario())
            .await
            .unwrap();

        let RunOutcome::Failed { workspace, .. } = outcome else {
            panic!("expected failure, got {}", outcome.label());
        };
        let letter = store.load_dead_letter(workspace.run_id()).await.unwrap();
        assert!(letter.is_some());
        assert_eq!(sink.alert_count(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_dead_letter_is_an_error() {
        let store = Arc::new(FlakyStore::new(0, 2));
        let sink = Arc::new(RecordingSink::default());
        let err = auto_fail_on_black(Arc::clone(&store), Arc::clone(&sink))
            .execute(scenario())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Store(StoreError::Unavailable(_))
        ));

        // the live record still says FAILED and the operator was alerted
        let runs = store.list_runs().await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert!(store.load_dead_letter(&runs[0].run_id).await.unwrap().is_none());
        let alerts = sink.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].1.contains("dead letter not written"));
    }

    #[tokio::test]
    async fn test_late_detached_resume_dead_letters() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::White, AgentError::Malformed("x".into())),
        );
        let orchestrator = fx.orchestrator(ScriptedReducer::new(), HilMode::Detached);
        let suspended = orchestrator
            .execute(scenario())
            .await
            .unwrap()
            .into_workspace();
        let run_id = suspended.run_id().clone();

        // the answer comes an hour into a 30s resume window
        let mut json = serde_json::to_value(&suspended).unwrap();
        json["run"]["suspension"]["suspended_at"] =
            serde_json::json!(Utc::now() - chrono::Duration::hours(1));
        fx.store.put_raw(run_id.workspace_key(), json.to_string()).await;

        fx.agent.heal(&Role::White);
        let outcome = orchestrator
            .resume(&run_id, ResumeSignal::retry())
            .await
            .unwrap();
        let RunOutcome::Failed { workspace, reason } = outcome else {
            panic!("expected failure, got {}", outcome.label());
        };
        assert!(reason.contains("no resume signal within 30s"));
        assert_eq!(workspace.status(), RunStatus::Failed);
        assert!(workspace.phase(&Role::White).unwrap().raw().is_empty());
        assert_eq!(workspace.audit().events_of(EventType::RunResumed).count(), 0);
        assert!(fx.store.load_dead_letter(&run_id).await.unwrap().is_some());
        assert_eq!(fx.sink.alert_count(), 1);
    }

    #[tokio::test]
    async fn test_human_input_refused_while_running() {
        let fx = Fixture::new(ScriptedAgent::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        // stops at the first phase and leaves the record RUNNING
        let stopped = fx
            .orchestrator(ScriptedReducer::new(), HilMode::Detached)
            .with_cancellation(cancel)
            .execute(scenario())
            .await
            .unwrap();
        let RunOutcome::Cancelled(ws) = stopped else {
            panic!("expected cancellation, got {}", stopped.label());
        };
        let run_id = ws.run_id().clone();

        let other = fx.orchestrator(ScriptedReducer::new(), HilMode::Detached);
        let err = other
            .record_human_contribution(&run_id, &Role::White, "alice", "Measure first")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::UnexpectedStatus {
                status: RunStatus::Running,
                ..
            }
        ));
        let err = other
            .record_global_summary(&run_id, "Pilot it", "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnexpectedStatus { .. }));
        let err = other
            .record_action_item(
                &run_id,
                ActionItem::new("Benchmark", Role::White, vec!["x".into()]),
                "alice",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnexpectedStatus { .. }));

        let stored = fx.store.load(&run_id).await.unwrap();
        assert_eq!(stored, ws);
        assert_eq!(stored.audit().events_of(EventType::HumanInput).count(), 0);
    }

    #[tokio::test]
    async fn test_human_input_checks_protocol() {
        let fx = Fixture::new(
            ScriptedAgent::new().fail_role(Role::White, AgentError::Malformed("x".into())),
        );
        let run_id = fx
            .orchestrator(ScriptedReducer::new(), HilMode::Detached)
            .execute(scenario())
            .await
            .unwrap()
            .workspace()
            .run_id()
            .clone();

        let other_protocol = Orchestrator::new(
            protocol(&[Role::White, Role::Red], 1),
            Arc::clone(&fx.agent) as Arc<dyn AgentPort>,
            Arc::new(ScriptedReducer::new()),
            Arc::clone(&fx.store) as Arc<dyn RecordStore>,
            OrchestratorConfig::default(),
        );
        let err = other_protocol
            .record_human_contribution(&run_id, &Role::White, "alice", "Measure first")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Domain(_)));
        assert_eq!(
            fx.store
                .load(&run_id)
                .await
                .unwrap()
                .audit()
                .events_of(EventType::HumanInput)
                .count(),
            0
        );
    }

    #[test]
    fn test_partial_absorb_advances_emitted() {
        let mut ws = Workspace::new(scenario(), &three_roles()).unwrap();
        let mut emitted = ws.events().len();
        let failed = AuditEvent::new(EventType::AgentFailed, "white-agent-0").with_role(Role::White);
        let result = super::super::run_phase::PhaseResult {
            role: Role::White,
            contributions: vec![],
            failures: vec![],
            // the duplicate stops appending after the first copy
            events: vec![failed.clone(), failed],
            agent_calls: 2,
            cancelled: false,
        };

        let err = absorb(&mut ws, &result, &mut emitted).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateId(_)));
        assert_eq!(emitted, ws.events().len());
        assert_eq!(ws.audit().events_of(EventType::AgentFailed).count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_refused() {
        let fx = Fixture::new(ScriptedAgent::new());
        let orchestrator = fx.orchestrator(ScriptedReducer::new(), HilMode::Detached);
        let ws = Workspace::new(scenario(), &three_roles()).unwrap();
        let mut json = serde_json::to_value(&ws).unwrap();
        json["run"]["cursor"] = serde_json::json!(42);
        fx.store
            .put_raw(ws.run_id().workspace_key(), json.to_string())
            .await;

        let err = orchestrator.continue_run(ws.run_id()).await.unwrap_err();
        assert!(err.is_critical());
        assert!(matches!(
            err,
            OrchestratorError::Store(StoreError::Corrupt { .. })
        ));
    }
}
