//! Workspace aggregate - the single unit of persistence for a run.
//!
//! All mutation goes through the methods here, which enforce:
//! - `raw[]` and `audit[]` are append-only
//! - a synthesis only derives from contributions of its own phase
//! - artifact provenance is non-empty and resolves
//! - ids are unique workspace-wide
//! - terminal runs accept no further mutation
//!
//! [`Workspace::validate`] re-checks all of this on a loaded record.

use super::artifact::{Artifact, Artifacts};
use super::audit::{Audit, AuditEvent, AuditMetrics, EventType};
use super::contribution::Contribution;
use super::run::{Run, RunStatus};
use super::synthesis::Synthesis;
use crate::core::error::DomainError;
use crate::core::ids::RunId;
use crate::protocol::{ProtocolDefinition, Role};
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// State for a single phase (role)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    role: Role,
    #[serde(default)]
    raw: Vec<Contribution>,
    #[serde(default)]
    synthesis: Option<Synthesis>,
    /// Syntheses replaced by a later aggregation, kept so provenance resolves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    superseded: Vec<Synthesis>,
}

impl PhaseState {
    fn new(role: Role) -> Self {
        Self {
            role,
            raw: Vec::new(),
            synthesis: None,
            superseded: Vec::new(),
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn raw(&self) -> &[Contribution] {
        &self.raw
    }

    pub fn synthesis(&self) -> Option<&Synthesis> {
        self.synthesis.as_ref()
    }

    pub fn superseded(&self) -> &[Synthesis] {
        &self.superseded
    }

    pub fn contains_contribution(&self, id: &str) -> bool {
        self.raw.iter().any(|c| c.contribution_id == id)
    }

    fn syntheses(&self) -> impl Iterator<Item = &Synthesis> {
        self.superseded.iter().chain(self.synthesis.iter())
    }
}

/// The complete record of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub(crate) run: Run,
    scenario: Scenario,
    phases: Vec<PhaseState>,
    #[serde(default)]
    artifacts: Artifacts,
    #[serde(default)]
    audit: Audit,
}

impl Workspace {
    /// Create the workspace for a new run: status PENDING, one empty phase
    /// per protocol role, and a `RUN_CREATED` event.
    pub fn new(scenario: Scenario, protocol: &ProtocolDefinition) -> Result<Self, DomainError> {
        scenario.validate()?;
        protocol.validate()?;

        let mut workspace = Self {
            run: Run::new(protocol.id()),
            scenario,
            phases: protocol.roles().into_iter().map(PhaseState::new).collect(),
            artifacts: Artifacts::default(),
            audit: Audit::default(),
        };
        let event = AuditEvent::new(EventType::RunCreated, "orchestrator").with_data(
            serde_json::json!({
                "protocol": workspace.run.protocol,
                "roles": protocol.roles().iter().map(Role::as_str).collect::<Vec<_>>(),
            }),
        );
        workspace.audit.events.push(event);
        Ok(workspace)
    }

    // ==================== Accessors ====================

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn run_id(&self) -> &RunId {
        &self.run.run_id
    }

    pub fn status(&self) -> RunStatus {
        self.run.status
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn phases(&self) -> &[PhaseState] {
        &self.phases
    }

    pub fn phase(&self, role: &Role) -> Option<&PhaseState> {
        self.phases.iter().find(|p| &p.role == role)
    }

    pub fn phase_at(&self, index: usize) -> Option<&PhaseState> {
        self.phases.get(index)
    }

    pub fn roles(&self) -> Vec<Role> {
        self.phases.iter().map(|p| p.role.clone()).collect()
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn audit(&self) -> &Audit {
        &self.audit
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.audit.events
    }

    pub fn metrics(&self) -> &AuditMetrics {
        &self.audit.metrics
    }

    /// All contributions across phases, in phase order then arrival order
    pub fn contributions(&self) -> impl Iterator<Item = &Contribution> {
        self.phases.iter().flat_map(|p| p.raw.iter())
    }

    pub fn contribution_count(&self) -> usize {
        self.phases.iter().map(|p| p.raw.len()).sum()
    }

    /// Every contribution and synthesis id, the universe artifacts may cite
    pub fn known_ids(&self) -> HashSet<&str> {
        let mut ids = HashSet::new();
        for phase in &self.phases {
            ids.extend(phase.raw.iter().map(|c| c.contribution_id.as_str()));
            ids.extend(phase.syntheses().map(|s| s.synthesis_id.as_str()));
        }
        ids
    }

    // ==================== Append-only mutation ====================

    pub fn set_mode(&mut self, mode: super::run::RunMode) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.run.mode = mode;
        self.run.touch();
        Ok(())
    }

    pub fn set_initiator(&mut self, initiator: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.run.initiator = initiator.into();
        Ok(())
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.run.tags.push(tag.into());
        Ok(())
    }

    /// Append a contribution to its phase's `raw[]`
    pub fn append_contribution(&mut self, contribution: Contribution) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        if self.known_ids().contains(contribution.contribution_id.as_str()) {
            return Err(DomainError::DuplicateId(contribution.contribution_id));
        }
        let index = self.phase_index(&contribution.role)?;
        self.audit.metrics.record_contribution(&contribution);
        self.phases[index].raw.push(contribution);
        self.run.touch();
        Ok(())
    }

    /// Attach (or replace) a phase's synthesis.
    ///
    /// A replaced synthesis moves to the phase's superseded list; raw
    /// contributions are untouched.
    pub fn attach_synthesis(&mut self, synthesis: Synthesis) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        if self.known_ids().contains(synthesis.synthesis_id.as_str()) {
            return Err(DomainError::DuplicateId(synthesis.synthesis_id));
        }
        let index = self.phase_index(&synthesis.role)?;
        let phase = &mut self.phases[index];
        if let Some(missing) = synthesis
            .derived_from
            .iter()
            .find(|id| !phase.contains_contribution(id))
        {
            return Err(DomainError::Provenance(format!(
                "synthesis for '{}' derives from unknown contribution '{}'",
                synthesis.role, missing
            )));
        }
        if let Some(previous) = phase.synthesis.take() {
            phase.superseded.push(previous);
        }
        phase.synthesis = Some(synthesis);
        self.audit.metrics.record_aggregation();
        self.run.touch();
        Ok(())
    }

    /// Append an audit event
    pub fn append_event(&mut self, event: AuditEvent) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        if self.audit.events.iter().any(|e| e.event_id == event.event_id) {
            return Err(DomainError::DuplicateId(event.event_id));
        }
        self.audit.events.push(event);
        Ok(())
    }

    pub fn record_agent_calls(&mut self, calls: u64) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.audit.metrics.record_agent_calls(calls);
        Ok(())
    }

    pub fn add_cost(&mut self, cost_usd: f64) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.audit.metrics.add_cost(cost_usd);
        Ok(())
    }

    /// Record an artifact after checking its provenance resolves
    pub fn record_artifact(&mut self, artifact: Artifact) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.check_provenance(artifact.id(), artifact.based_on())?;
        self.artifacts.push(artifact);
        self.run.touch();
        Ok(())
    }

    pub fn set_global_summary(&mut self, summary: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_mutable()?;
        self.artifacts.global_summary = Some(summary.into());
        self.run.touch();
        Ok(())
    }

    // ==================== Invariants ====================

    /// Re-check every invariant; used when a workspace is loaded
    pub fn validate(&self) -> Result<(), DomainError> {
        let violation = |msg: String| Err(DomainError::InvariantViolation(msg));

        if self.scenario.validate().is_err() {
            return violation("scenario is incomplete".to_string());
        }

        let mut roles = HashSet::new();
        let mut ids = HashSet::new();
        for phase in &self.phases {
            if !roles.insert(&phase.role) {
                return violation(format!("role '{}' appears twice", phase.role));
            }
            for c in &phase.raw {
                if c.role != phase.role {
                    return violation(format!(
                        "contribution '{}' of role '{}' stored under '{}'",
                        c.contribution_id, c.role, phase.role
                    ));
                }
                if !ids.insert(c.contribution_id.as_str()) {
                    return violation(format!("duplicate id '{}'", c.contribution_id));
                }
            }
            for s in phase.syntheses() {
                if !ids.insert(s.synthesis_id.as_str()) {
                    return violation(format!("duplicate id '{}'", s.synthesis_id));
                }
                if let Some(missing) = s
                    .derived_from
                    .iter()
                    .find(|id| !phase.contains_contribution(id))
                {
                    return violation(format!(
                        "synthesis '{}' derives from unknown contribution '{}'",
                        s.synthesis_id, missing
                    ));
                }
            }
        }

        for (artifact_id, based_on) in self.artifacts.provenance() {
            if let Err(e) = self.check_provenance(artifact_id, based_on) {
                return violation(e.to_string());
            }
        }

        let mut event_ids = HashSet::new();
        for event in &self.audit.events {
            if !event_ids.insert(event.event_id.as_str()) {
                return violation(format!("duplicate event id '{}'", event.event_id));
            }
        }

        if self.run.cursor > self.phases.len() {
            return violation(format!(
                "cursor {} beyond {} phases",
                self.run.cursor,
                self.phases.len()
            ));
        }
        let waiting = self.run.status == RunStatus::WaitingForHuman;
        if waiting != self.run.suspension.is_some() {
            return violation(format!(
                "status {} inconsistent with suspension record",
                self.run.status
            ));
        }
        Ok(())
    }

    /// Check that the workspace was built for `protocol`
    pub fn check_protocol(&self, protocol: &ProtocolDefinition) -> Result<(), DomainError> {
        if self.run.protocol != protocol.id() {
            return Err(DomainError::InvalidProtocol(format!(
                "workspace was created with '{}', not '{}'",
                self.run.protocol,
                protocol.id()
            )));
        }
        if self.roles() != protocol.roles() {
            return Err(DomainError::InvalidProtocol(
                "workspace phases do not match the protocol roles".to_string(),
            ));
        }
        Ok(())
    }

    // ==================== Internals ====================

    pub(crate) fn ensure_mutable(&self) -> Result<(), DomainError> {
        if self.run.status.is_terminal() {
            return Err(DomainError::RunTerminal(self.run.status));
        }
        Ok(())
    }

    /// Push an event without the terminal check; used by the state machine
    /// for the event that accompanies the terminal transition itself.
    pub(crate) fn push_event(&mut self, event: AuditEvent) {
        self.audit.events.push(event);
    }

    fn phase_index(&self, role: &Role) -> Result<usize, DomainError> {
        self.phases
            .iter()
            .position(|p| &p.role == role)
            .ok_or_else(|| DomainError::UnknownRole(role.to_string()))
    }

    fn check_provenance(&self, artifact_id: &str, based_on: &[String]) -> Result<(), DomainError> {
        if based_on.is_empty() {
            return Err(DomainError::Provenance(format!(
                "artifact '{artifact_id}' has empty provenance"
            )));
        }
        let known = self.known_ids();
        if let Some(missing) = based_on.iter().find(|id| !known.contains(id.as_str())) {
            return Err(DomainError::Provenance(format!(
                "artifact '{artifact_id}' cites unknown id '{missing}'"
            )));
        }
        Ok(())
    }
}
