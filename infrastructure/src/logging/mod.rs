//! Logging infrastructure for the audit feed.
//!
//! Provides [`JsonlAuditSink`], a JSONL file writer, and [`TracingAuditSink`],
//! which forwards events to `tracing`. Both implement the
//! [`AuditSink`](sixhats_application::AuditSink) port.

mod jsonl_audit;
mod tracing_sink;

pub use jsonl_audit::JsonlAuditSink;
pub use tracing_sink::TracingAuditSink;
