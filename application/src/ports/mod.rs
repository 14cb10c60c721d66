//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent;
pub mod audit_sink;
pub mod progress;
pub mod record_store;
pub mod reducer;
pub mod resume_signal;
