//! Domain layer for sixhats
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Protocol
//!
//! A [`ProtocolDefinition`] is an ordered list of roles (the six thinking
//! hats by default), each with the set of agents that speak for it.
//!
//! ## Workspace
//!
//! The [`Workspace`] is the append-only record of one run: raw
//! contributions per phase, the synthesis derived from them, cross-phase
//! artifacts, and the audit log. It is the single unit of persistence.
//!
//! ## Orchestration
//!
//! [`transition`] is the run lifecycle as a pure function of
//! `(Workspace, OrchestratorEvent)`; the application layer executes the
//! [`Action`] it returns.

pub mod config;
pub mod core;
pub mod orchestration;
pub mod protocol;
pub mod scenario;
pub mod workspace;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{error::DomainError, ids::RunId};
pub use orchestration::{
    policy::{HilMode, HilPolicy, ResumeAction, ResumeSignal},
    state_machine::{Action, OrchestratorEvent, transition},
};
pub use protocol::{AgentInfo, PhaseSpec, ProtocolDefinition, Role};
pub use scenario::{Scenario, ScenarioInputs};
pub use workspace::{
    artifact::{ActionItem, ActionStatus, Artifact, Artifacts, Decision, OpenQuestion, Priority},
    audit::{Audit, AuditEvent, AuditMetrics, EventType},
    contribution::{Contribution, ContributionDraft, TokenCounts},
    entities::{PhaseState, Workspace},
    run::{CriticalKind, Run, RunMode, RunStatus, Suspension},
    synthesis::{Cluster, DEFAULT_FALLBACK_KEY_POINTS, FALLBACK_MARKER, Synthesis, SynthesisDraft},
};
