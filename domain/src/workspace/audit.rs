//! Audit log - the authoritative record of what happened, in what order.

use super::contribution::Contribution;
use crate::core::ids::new_id;
use crate::protocol::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    RunCreated,
    RunStarted,
    PhaseStarted,
    ContributionRecorded,
    AgentFailed,
    AggregationSuccess,
    AggregationFallback,
    PhaseCompleted,
    PhaseSkipped,
    RunSuspended,
    RunResumed,
    RunCancelled,
    HumanInput,
    ArtifactRecorded,
    RunCompleted,
    RunFailed,
    RunDeadLettered,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::RunCreated => "RUN_CREATED",
            EventType::RunStarted => "RUN_STARTED",
            EventType::PhaseStarted => "PHASE_STARTED",
            EventType::ContributionRecorded => "CONTRIBUTION_RECORDED",
            EventType::AgentFailed => "AGENT_FAILED",
            EventType::AggregationSuccess => "AGGREGATION_SUCCESS",
            EventType::AggregationFallback => "AGGREGATION_FALLBACK",
            EventType::PhaseCompleted => "PHASE_COMPLETED",
            EventType::PhaseSkipped => "PHASE_SKIPPED",
            EventType::RunSuspended => "RUN_SUSPENDED",
            EventType::RunResumed => "RUN_RESUMED",
            EventType::RunCancelled => "RUN_CANCELLED",
            EventType::HumanInput => "HUMAN_INPUT",
            EventType::ArtifactRecorded => "ARTIFACT_RECORDED",
            EventType::RunCompleted => "RUN_COMPLETED",
            EventType::RunFailed => "RUN_FAILED",
            EventType::RunDeadLettered => "RUN_DEAD_LETTERED",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable entry in the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub actor: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(event_type: EventType, actor: impl Into<String>) -> Self {
        Self {
            event_id: new_id(),
            event_type,
            role: None,
            actor: actor.into(),
            data: serde_json::Value::Object(serde_json::Map::new()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Aggregate metrics for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditMetrics {
    pub total_tokens_in: u64,
    pub total_tokens_out: u64,
    pub total_latency_ms: u64,
    pub estimated_cost_usd: f64,
    pub agent_call_count: u64,
    pub aggregation_call_count: u64,
}

impl AuditMetrics {
    pub fn record_contribution(&mut self, contribution: &Contribution) {
        self.total_tokens_in += contribution.token_counts.input;
        self.total_tokens_out += contribution.token_counts.output;
        self.total_latency_ms += contribution.latency_ms;
    }

    pub fn record_agent_calls(&mut self, calls: u64) {
        self.agent_call_count += calls;
    }

    pub fn record_aggregation(&mut self) {
        self.aggregation_call_count += 1;
    }

    pub fn add_cost(&mut self, cost_usd: f64) {
        if cost_usd.is_finite() && cost_usd > 0.0 {
            self.estimated_cost_usd += cost_usd;
        }
    }
}

/// Audit trail and metrics for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Audit {
    pub events: Vec<AuditEvent>,
    pub metrics: AuditMetrics,
}

impl Audit {
    pub fn events_of(&self, event_type: EventType) -> impl Iterator<Item = &AuditEvent> {
        self.events
            .iter()
            .filter(move |e| e.event_type == event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AgentInfo;
    use crate::workspace::contribution::ContributionDraft;

    #[test]
    fn test_event_type_wire_name() {
        let json = serde_json::to_string(&EventType::AggregationFallback).unwrap();
        assert_eq!(json, "\"AGGREGATION_FALLBACK\"");
        assert_eq!(EventType::PhaseCompleted.to_string(), "PHASE_COMPLETED");
    }

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::new(EventType::PhaseStarted, "orchestrator")
            .with_role(Role::Black)
            .with_data(serde_json::json!({"agents": 3}));
        assert_eq!(event.role, Some(Role::Black));
        assert_eq!(event.data["agents"], 3);
    }

    #[test]
    fn test_metrics_accumulate() {
        let mut metrics = AuditMetrics::default();
        let c = Contribution::from_draft(
            Role::Red,
            AgentInfo::new("a", "A"),
            ContributionDraft::new("gut feeling").with_tokens(100, 50),
        )
        .with_latency_ms(1500);
        metrics.record_contribution(&c);
        metrics.record_agent_calls(2);
        metrics.record_aggregation();
        metrics.add_cost(0.01);
        metrics.add_cost(f64::NAN);
        assert_eq!(metrics.total_tokens_in, 100);
        assert_eq!(metrics.total_tokens_out, 50);
        assert_eq!(metrics.total_latency_ms, 1500);
        assert_eq!(metrics.agent_call_count, 2);
        assert_eq!(metrics.aggregation_call_count, 1);
        assert!((metrics.estimated_cost_usd - 0.01).abs() < f64::EPSILON);
    }
}
