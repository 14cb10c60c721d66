//! Port for streaming audit events out of the process.
//!
//! The workspace audit log is the authoritative record; this port is the
//! live feed of the same events (plus dead-letter alerts) for external
//! observers. `emit` is synchronous and non-fallible so a broken sink never
//! disrupts a run; adapters log their own failures.

use sixhats_domain::{AuditEvent, RunId};

pub trait AuditSink: Send + Sync {
    /// Record one event of `run_id`
    fn emit(&self, run_id: &RunId, event: &AuditEvent);

    /// Raise an alert for a dead-lettered run
    fn alert(&self, _run_id: &RunId, _context: &str) {}
}

/// No-op sink for tests and when no audit feed is configured.
pub struct NoAuditSink;

impl AuditSink for NoAuditSink {
    fn emit(&self, _run_id: &RunId, _event: &AuditEvent) {}
}

/// Fans each event out to several sinks
pub struct CompositeAuditSink {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl CompositeAuditSink {
    pub fn new(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

impl AuditSink for CompositeAuditSink {
    fn emit(&self, run_id: &RunId, event: &AuditEvent) {
        for sink in &self.sinks {
            sink.emit(run_id, event);
        }
    }

    fn alert(&self, run_id: &RunId, context: &str) {
        for sink in &self.sinks {
            sink.alert(run_id, context);
        }
    }
}
