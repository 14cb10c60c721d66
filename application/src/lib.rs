//! Application layer for sixhats
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{OrchestratorConfig, RetryPolicy};
pub use ports::{
    agent::{AgentError, AgentPort, PhaseContext},
    audit_sink::{AuditSink, CompositeAuditSink, NoAuditSink},
    progress::{NoProgress, ProgressNotifier},
    record_store::{DeadLetter, MemoryRecordStore, RecordStore, RunSummary, StoreError},
    reducer::{AggregationError, ReductionPort},
    resume_signal::{NoResumeSignal, ResumeSignalError, ResumeSignalPort, ScriptedResumeSignal},
};
pub use use_cases::aggregate::{Aggregated, Aggregator};
pub use use_cases::orchestrate::{Orchestrator, OrchestratorError, RunOutcome};
pub use use_cases::run_phase::{AgentFailure, PhaseError, PhaseResult, PhaseRunner};
