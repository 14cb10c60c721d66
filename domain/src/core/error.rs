//! Domain error types

use crate::workspace::run::RunStatus;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Invalid protocol: {0}")]
    InvalidProtocol(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Run is terminal ({0}); no further mutation is permitted")]
    RunTerminal(RunStatus),

    #[error("Invalid transition from {from}: {event}")]
    InvalidTransition { from: RunStatus, event: String },

    #[error("Provenance error: {0}")]
    Provenance(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Workspace invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Check if this error means the workspace itself is corrupt
    pub fn is_corruption(&self) -> bool {
        matches!(self, DomainError::InvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_error_display() {
        let error = DomainError::RunTerminal(RunStatus::Completed);
        assert_eq!(
            error.to_string(),
            "Run is terminal (completed); no further mutation is permitted"
        );
    }

    #[test]
    fn test_is_corruption_check() {
        assert!(DomainError::InvariantViolation("x".to_string()).is_corruption());
        assert!(!DomainError::UnknownRole("x".to_string()).is_corruption());
        assert!(!DomainError::Provenance("x".to_string()).is_corruption());
    }
}
