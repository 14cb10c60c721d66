//! Reduction port
//!
//! Turns a phase's contributions into a [`SynthesisDraft`]. The aggregator
//! wraps it and substitutes a fallback synthesis when it fails.

use async_trait::async_trait;
use sixhats_domain::{Contribution, Role, Scenario, SynthesisDraft};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("Reduction failed: {0}")]
    Failed(String),

    #[error("Reduction timed out")]
    Timeout,

    #[error("Unparsable reduction output: {0}")]
    Unparsable(String),
}

impl AggregationError {
    pub fn kind(&self) -> &'static str {
        match self {
            AggregationError::Failed(_) => "failed",
            AggregationError::Timeout => "timeout",
            AggregationError::Unparsable(_) => "unparsable",
        }
    }
}

#[async_trait]
pub trait ReductionPort: Send + Sync {
    async fn reduce(
        &self,
        role: &Role,
        scenario: &Scenario,
        contributions: &[Contribution],
    ) -> Result<SynthesisDraft, AggregationError>;
}
