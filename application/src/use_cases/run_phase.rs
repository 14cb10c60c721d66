//! Run Phase use case
//!
//! Fans one phase out to its agents in parallel and collects the results.
//! Each agent runs in its own task: one agent's failure or latency never
//! blocks or cancels another's. Contributions are kept in arrival order.

use super::retry::with_retry;
use crate::config::RetryPolicy;
use crate::ports::agent::{AgentError, AgentPort, PhaseContext};
use crate::ports::audit_sink::AuditSink;
use crate::ports::progress::ProgressNotifier;
use serde_json::json;
use sixhats_domain::{
    AgentInfo, AuditEvent, Contribution, ContributionDraft, EventType, Role, RunId, Scenario,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseError {
    #[error("No agents configured for {0}")]
    NoAgents(Role),

    #[error("All {failures} agents failed for {role}")]
    AllAgentsFailed { role: Role, failures: usize },
}

impl PhaseError {
    pub fn is_critical(&self) -> bool {
        matches!(self, PhaseError::AllAgentsFailed { .. })
    }
}

/// One agent that produced no contribution
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFailure {
    pub agent_id: String,
    pub error_kind: String,
    pub message: String,
    pub attempts: u32,
}

/// Everything a phase produced
#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub role: Role,
    /// In arrival order
    pub contributions: Vec<Contribution>,
    pub failures: Vec<AgentFailure>,
    /// Already emitted to the audit sink; to be appended to the workspace
    pub events: Vec<AuditEvent>,
    /// Total invocations including retries
    pub agent_calls: u64,
    /// The phase was cut short by cancellation
    pub cancelled: bool,
}

impl PhaseResult {
    pub fn all_failed(&self) -> bool {
        self.contributions.is_empty() && !self.failures.is_empty()
    }

    /// `AllAgentsFailed` when nothing came back
    pub fn check(&self) -> Result<(), PhaseError> {
        if self.all_failed() && !self.cancelled {
            return Err(PhaseError::AllAgentsFailed {
                role: self.role.clone(),
                failures: self.failures.len(),
            });
        }
        Ok(())
    }
}

/// Input for a single phase
#[derive(Debug, Clone)]
pub struct PhaseRequest {
    pub role: Role,
    pub agents: Vec<AgentInfo>,
    pub scenario: Arc<Scenario>,
    pub context: Arc<PhaseContext>,
}

/// Use case for running one phase
pub struct PhaseRunner {
    agent: Arc<dyn AgentPort>,
    retry: RetryPolicy,
    agent_timeout: Option<Duration>,
    audit: Arc<dyn AuditSink>,
}

type AgentOutcome = (AgentInfo, Result<ContributionDraft, AgentError>, u32, Duration);

impl PhaseRunner {
    pub fn new(
        agent: Arc<dyn AgentPort>,
        retry: RetryPolicy,
        agent_timeout: Option<Duration>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            agent,
            retry,
            agent_timeout,
            audit,
        }
    }

    /// Run every agent of the phase and collect what comes back.
    ///
    /// On cancellation the still-running agents are aborted and the
    /// contributions collected so far are returned with `cancelled` set.
    pub async fn run(
        &self,
        request: PhaseRequest,
        progress: Arc<dyn ProgressNotifier>,
        cancel: &CancellationToken,
    ) -> Result<PhaseResult, PhaseError> {
        if request.agents.is_empty() {
            return Err(PhaseError::NoAgents(request.role));
        }

        let run_id = request.context.run_id.clone();
        let role = request.role.clone();
        info!(
            run_id = %run_id,
            role = %role,
            "Phase {}: dispatching {} agents",
            request.context.phase_index,
            request.agents.len()
        );

        let mut join_set = JoinSet::new();
        for agent in &request.agents {
            join_set.spawn(Self::invoke_agent(
                Arc::clone(&self.agent),
                role.clone(),
                agent.clone(),
                Arc::clone(&request.scenario),
                Arc::clone(&request.context),
                self.retry.clone(),
                self.agent_timeout,
                Arc::clone(&progress),
            ));
        }

        let mut result = PhaseResult {
            role: role.clone(),
            contributions: Vec::new(),
            failures: Vec::new(),
            events: Vec::new(),
            agent_calls: 0,
            cancelled: false,
        };

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(run_id = %run_id, role = %role, "Phase cancelled; aborting {} agents", join_set.len());
                    join_set.abort_all();
                    result.cancelled = true;
                    break;
                }
                joined = join_set.join_next() => joined,
            };

            match joined {
                None => break,
                Some(Ok((agent, Ok(draft), attempts, latency))) => {
                    let contribution = Contribution::from_draft(role.clone(), agent, draft)
                        .with_latency_ms(latency.as_millis() as u64)
                        .with_attempts(attempts);
                    debug!(
                        run_id = %run_id,
                        role = %role,
                        agent = %contribution.agent_info.agent_id,
                        attempts,
                        "Contribution recorded"
                    );
                    progress.on_agent_complete(&role, &contribution.agent_info.agent_id, true);
                    let event = AuditEvent::new(
                        EventType::ContributionRecorded,
                        contribution.agent_info.agent_id.clone(),
                    )
                    .with_role(role.clone())
                    .with_data(json!({
                        "contribution_id": contribution.contribution_id,
                        "attempts": attempts,
                        "latency_ms": contribution.latency_ms,
                        "tokens": contribution.token_counts.total(),
                    }));
                    self.record(&run_id, &mut result, event);
                    result.agent_calls += u64::from(attempts);
                    result.contributions.push(contribution);
                }
                Some(Ok((agent, Err(error), attempts, _))) => {
                    warn!(
                        run_id = %run_id,
                        role = %role,
                        agent = %agent.agent_id,
                        attempts,
                        "Agent failed: {}",
                        error
                    );
                    progress.on_agent_complete(&role, &agent.agent_id, false);
                    self.record_failure(
                        &run_id,
                        &mut result,
                        AgentFailure {
                            agent_id: agent.agent_id,
                            error_kind: error.kind().to_string(),
                            message: error.to_string(),
                            attempts,
                        },
                    );
                    result.agent_calls += u64::from(attempts);
                }
                Some(Err(e)) => {
                    warn!(run_id = %run_id, role = %role, "Task join error: {}", e);
                    self.record_failure(
                        &run_id,
                        &mut result,
                        AgentFailure {
                            agent_id: "unknown".to_string(),
                            error_kind: "panicked".to_string(),
                            message: e.to_string(),
                            attempts: 1,
                        },
                    );
                }
            }
        }

        info!(
            run_id = %run_id,
            role = %role,
            "Phase finished: {} contributions, {} failures",
            result.contributions.len(),
            result.failures.len()
        );
        Ok(result)
    }

    fn record(&self, run_id: &RunId, result: &mut PhaseResult, event: AuditEvent) {
        self.audit.emit(run_id, &event);
        result.events.push(event);
    }

    fn record_failure(&self, run_id: &RunId, result: &mut PhaseResult, failure: AgentFailure) {
        let event = AuditEvent::new(EventType::AgentFailed, failure.agent_id.clone())
            .with_role(result.role.clone())
            .with_data(json!({
                "error_kind": failure.error_kind,
                "message": failure.message,
                "attempts": failure.attempts,
            }));
        self.record(run_id, result, event);
        result.failures.push(failure);
    }

    /// One agent: optional jitter, then the retried call
    #[allow(clippy::too_many_arguments)]
    async fn invoke_agent(
        port: Arc<dyn AgentPort>,
        role: Role,
        agent: AgentInfo,
        scenario: Arc<Scenario>,
        context: Arc<PhaseContext>,
        retry: RetryPolicy,
        agent_timeout: Option<Duration>,
        progress: Arc<dyn ProgressNotifier>,
    ) -> AgentOutcome {
        let jitter = retry.dispatch_jitter();
        if !jitter.is_zero() {
            tokio::time::sleep(jitter).await;
        }

        let started = Instant::now();
        let attempted = with_retry(
            &retry,
            |_attempt| {
                Self::invoke_once(
                    Arc::clone(&port),
                    role.clone(),
                    agent.clone(),
                    Arc::clone(&scenario),
                    Arc::clone(&context),
                    agent_timeout,
                )
            },
            |attempt, error, delay| {
                warn!(
                    role = %role,
                    agent = %agent.agent_id,
                    attempt,
                    "Transient agent failure, retrying in {:?}: {}",
                    delay,
                    error
                );
                progress.on_agent_retry(&role, &agent.agent_id, attempt, delay);
            },
        )
        .await;

        (agent, attempted.result, attempted.attempts, started.elapsed())
    }

    async fn invoke_once(
        port: Arc<dyn AgentPort>,
        role: Role,
        agent: AgentInfo,
        scenario: Arc<Scenario>,
        context: Arc<PhaseContext>,
        agent_timeout: Option<Duration>,
    ) -> Result<ContributionDraft, AgentError> {
        let call = port.invoke(&role, &agent, &scenario, &context);
        let draft = match agent_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AgentError::Timeout)??,
            None => call.await?,
        };

        if draft.content.trim().is_empty() {
            return Err(AgentError::Validation("empty content".to_string()));
        }
        if let Some(confidence) = draft.confidence {
            if !confidence.is_finite() {
                return Err(AgentError::Malformed(format!(
                    "non-finite confidence {confidence}"
                )));
            }
        }
        Ok(draft)
    }
}
