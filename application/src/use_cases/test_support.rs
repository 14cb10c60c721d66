//! Scripted ports shared by the use case tests.

use crate::ports::agent::{AgentError, AgentPort, PhaseContext};
use crate::ports::reducer::{AggregationError, ReductionPort};
use async_trait::async_trait;
use sixhats_domain::{
    AgentInfo, Contribution, ContributionDraft, PhaseSpec, ProtocolDefinition, Role, Scenario,
    SynthesisDraft,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

pub fn scenario() -> Scenario {
    Scenario::new("Adopt Rust", "Should the payments service move to Rust?")
        .with_context("Team of six, two know Rust")
        .with_objective("Lower p99 latency")
}

pub fn agents(role: &Role, n: usize) -> Vec<AgentInfo> {
    (0..n)
        .map(|i| AgentInfo::new(format!("{}-agent-{i}", role.as_str()), format!("Persona {i}")))
        .collect()
}

pub fn protocol(roles: &[Role], agents_per_role: usize) -> ProtocolDefinition {
    ProtocolDefinition::new(
        "test",
        "v1",
        roles
            .iter()
            .map(|r| PhaseSpec::new(r.clone(), agents(r, agents_per_role)))
            .collect(),
    )
}

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Step {
    Ok,
    Content(String),
    Fail(AgentError),
    /// Never answers
    Hang,
}

/// Agent whose replies are scripted per agent id; unscripted calls succeed
#[derive(Default)]
pub struct ScriptedAgent {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    failing_roles: Mutex<HashMap<Role, AgentError>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, agent_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(agent_id.to_string(), steps.into());
        self
    }

    /// Every call for `role` fails with `error` until healed
    pub fn fail_role(self, role: Role, error: AgentError) -> Self {
        self.failing_roles.lock().unwrap().insert(role, error);
        self
    }

    pub fn heal(&self, role: &Role) {
        self.failing_roles.lock().unwrap().remove(role);
    }

    pub fn calls(&self, agent_id: &str) -> u32 {
        self.calls.lock().unwrap().get(agent_id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl AgentPort for ScriptedAgent {
    async fn invoke(
        &self,
        role: &Role,
        agent: &AgentInfo,
        _scenario: &Scenario,
        context: &PhaseContext,
    ) -> Result<ContributionDraft, AgentError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(agent.agent_id.clone())
            .or_default() += 1;

        if let Some(error) = self.failing_roles.lock().unwrap().get(role) {
            return Err(error.clone());
        }

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&agent.agent_id)
            .and_then(|q| q.pop_front())
            .unwrap_or(Step::Ok);

        match step {
            Step::Ok => Ok(ContributionDraft::new(format!(
                "{} sees a point about {}\nPhase {} detail from {}",
                agent.persona,
                role.display_name(),
                context.phase_index,
                agent.agent_id
            ))
            .with_tokens(100, 40)),
            Step::Content(content) => Ok(ContributionDraft::new(content)),
            Step::Fail(error) => Err(error),
            Step::Hang => std::future::pending().await,
        }
    }
}

/// Reducer that summarises by counting, or fails on demand
#[derive(Default)]
pub struct ScriptedReducer {
    failures_left: AtomicU32,
    fail_always: bool,
    empty_summary: bool,
}

impl ScriptedReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_always: true,
            ..Self::default()
        }
    }

    pub fn failing_times(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            ..Self::default()
        }
    }

    pub fn empty_summary() -> Self {
        Self {
            empty_summary: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ReductionPort for ScriptedReducer {
    async fn reduce(
        &self,
        role: &Role,
        _scenario: &Scenario,
        contributions: &[Contribution],
    ) -> Result<SynthesisDraft, AggregationError> {
        if self.fail_always {
            return Err(AggregationError::Failed("reducer offline".to_string()));
        }
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(AggregationError::Failed("transient reducer error".to_string()));
        }
        if self.empty_summary {
            return Ok(SynthesisDraft::new(""));
        }
        Ok(SynthesisDraft::new(format!(
            "{} synthesis of {} contributions",
            role.display_name(),
            contributions.len()
        ))
        .with_key_points(vec!["point".to_string()])
        .with_confidence(0.8))
    }
}
