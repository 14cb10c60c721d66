//! Aggregate use case
//!
//! Reduces a phase's contributions into a [`Synthesis`]. A failed or
//! unusable reduction never fails the phase: it is replaced by the
//! fallback synthesis built from the raw contributions.

use crate::ports::audit_sink::AuditSink;
use crate::ports::reducer::{AggregationError, ReductionPort};
use serde_json::json;
use sixhats_domain::{AuditEvent, Contribution, EventType, Role, RunId, Scenario, Synthesis};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A synthesis plus the audit event describing how it was obtained
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub synthesis: Synthesis,
    /// Already emitted to the audit sink
    pub event: AuditEvent,
}

/// Use case for reducing contributions
pub struct Aggregator {
    reducer: Arc<dyn ReductionPort>,
    audit: Arc<dyn AuditSink>,
    max_key_points: usize,
    timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(
        reducer: Arc<dyn ReductionPort>,
        audit: Arc<dyn AuditSink>,
        max_key_points: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            reducer,
            audit,
            max_key_points,
            timeout,
        }
    }

    pub async fn aggregate(
        &self,
        run_id: &RunId,
        role: &Role,
        scenario: &Scenario,
        contributions: &[Contribution],
    ) -> Aggregated {
        let (synthesis, event) = match self.reduce(role, scenario, contributions).await {
            Ok(synthesis) => {
                info!(run_id = %run_id, role = %role, "Aggregation succeeded");
                let event = AuditEvent::new(EventType::AggregationSuccess, "aggregator")
                    .with_role(role.clone())
                    .with_data(json!({
                        "synthesis_id": synthesis.synthesis_id,
                        "derived_from": synthesis.derived_from.len(),
                        "confidence": synthesis.confidence,
                    }));
                (synthesis, event)
            }
            Err(error) => {
                warn!(run_id = %run_id, role = %role, "Aggregation failed, using fallback: {}", error);
                let synthesis = Synthesis::fallback(
                    role.clone(),
                    contributions,
                    self.max_key_points,
                    &error.to_string(),
                );
                let event = AuditEvent::new(EventType::AggregationFallback, "aggregator")
                    .with_role(role.clone())
                    .with_data(json!({
                        "synthesis_id": synthesis.synthesis_id,
                        "error_kind": error.kind(),
                        "message": error.to_string(),
                        "key_points": synthesis.key_points.len(),
                    }));
                (synthesis, event)
            }
        };

        self.audit.emit(run_id, &event);
        Aggregated { synthesis, event }
    }

    async fn reduce(
        &self,
        role: &Role,
        scenario: &Scenario,
        contributions: &[Contribution],
    ) -> Result<Synthesis, AggregationError> {
        let call = self.reducer.reduce(role, scenario, contributions);
        let draft = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AggregationError::Timeout)??,
            None => call.await?,
        };
        if let Some(defect) = draft.defect() {
            return Err(AggregationError::Unparsable(defect));
        }
        Ok(Synthesis::from_draft(role.clone(), draft, contributions))
    }
}
