//! Audit sink that mirrors events into the `tracing` stream.

use sixhats_application::AuditSink;
use sixhats_domain::{AuditEvent, RunId};
use tracing::{debug, error};

/// Logs every audit event at `debug` and alerts at `error`
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, run_id: &RunId, event: &AuditEvent) {
        debug!(
            target: "sixhats::audit",
            run_id = %run_id,
            event_type = event.event_type.as_str(),
            role = event.role.as_ref().map(|r| r.as_str()).unwrap_or("-"),
            actor = %event.actor,
            "{}",
            event.data
        );
    }

    fn alert(&self, run_id: &RunId, context: &str) {
        error!(target: "sixhats::audit", run_id = %run_id, "ALERT: {}", context);
    }
}
