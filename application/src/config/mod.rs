//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`RetryPolicy`] - backoff and jitter for transient agent failures
//! - [`OrchestratorConfig`] - timeouts, fallback bound and HiL policy for the driver

pub mod orchestrator_config;
pub mod retry_policy;

pub use orchestrator_config::OrchestratorConfig;
pub use retry_policy::RetryPolicy;
