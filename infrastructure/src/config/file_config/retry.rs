//! Retry configuration from TOML (`[retry]` section)

use sixhats_application::RetryPolicy;
use sixhats_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw retry configuration from TOML
///
/// ```toml
/// [retry]
/// max_attempts = 3
/// min_backoff_ms = 2000
/// max_backoff_ms = 30000
/// jitter_ms = 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_attempts: u32,
    pub min_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub jitter_ms: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff_ms: 2000,
            max_backoff_ms: 30_000,
            jitter_ms: 0,
        }
    }
}

impl FileRetryConfig {
    pub fn to_retry_policy(&self) -> (RetryPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        if self.max_attempts == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "retry.max_attempts".to_string(),
                    value: "0".to_string(),
                },
                "retry.max_attempts: must be at least 1, using 1",
            ));
        }
        if self.max_backoff_ms < self.min_backoff_ms {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "retry.max_backoff_ms".to_string(),
                    value: self.max_backoff_ms.to_string(),
                },
                format!(
                    "retry.max_backoff_ms ({}) is below min_backoff_ms ({}), using {}",
                    self.max_backoff_ms, self.min_backoff_ms, self.min_backoff_ms
                ),
            ));
        }

        let policy = RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_backoff(
                Duration::from_millis(self.min_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
            .with_jitter(Duration::from_millis(self.jitter_ms));
        (policy, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_defaults() {
        let (policy, issues) = FileRetryConfig::default().to_retry_policy();
        assert!(issues.is_empty());
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_inverted_backoff_is_clamped() {
        let config = FileRetryConfig {
            min_backoff_ms: 5000,
            max_backoff_ms: 1000,
            ..Default::default()
        };
        let (policy, issues) = config.to_retry_policy();
        assert_eq!(issues.len(), 1);
        assert_eq!(policy.max_backoff, Duration::from_secs(5));
    }
}
