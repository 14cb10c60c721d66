//! Orchestrator configuration from TOML (`[orchestrator]` section)

use sixhats_domain::{ConfigIssue, ConfigIssueCode, HilMode, HilPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw orchestrator configuration from TOML
///
/// ```toml
/// [orchestrator]
/// hil_mode = "interactive"      # "interactive", "detached", "auto_fail"
/// resume_timeout_secs = 3600
/// agent_timeout_secs = 120      # 0 disables the per-call timeout
/// aggregation_timeout_secs = 120
/// fallback_key_points = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    pub hil_mode: String,
    pub resume_timeout_secs: u64,
    pub agent_timeout_secs: u64,
    pub aggregation_timeout_secs: u64,
    pub fallback_key_points: usize,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            hil_mode: "interactive".to_string(),
            resume_timeout_secs: 3600,
            agent_timeout_secs: 120,
            aggregation_timeout_secs: 120,
            fallback_key_points: 5,
        }
    }
}

impl FileOrchestratorConfig {
    /// Parse hil_mode string into HilMode enum, returning warnings on failure.
    pub fn parse_hil_mode(&self) -> (HilMode, Vec<ConfigIssue>) {
        match self.hil_mode.parse::<HilMode>() {
            Ok(mode) => (mode, vec![]),
            Err(_) => {
                let issue = ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "orchestrator.hil_mode".to_string(),
                        value: self.hil_mode.clone(),
                        valid_values: vec![
                            "interactive".to_string(),
                            "detached".to_string(),
                            "auto_fail".to_string(),
                        ],
                    },
                    format!(
                        "orchestrator.hil_mode: unknown value '{}', falling back to 'interactive'",
                        self.hil_mode
                    ),
                );
                (HilMode::default(), vec![issue])
            }
        }
    }

    pub fn to_hil_policy(&self) -> (HilPolicy, Vec<ConfigIssue>) {
        let (mode, mut issues) = self.parse_hil_mode();
        let mut policy = HilPolicy::default().with_mode(mode);
        if self.resume_timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "orchestrator.resume_timeout_secs".to_string(),
                    value: "0".to_string(),
                },
                "orchestrator.resume_timeout_secs: 0 would dead-letter every suspension, using the default",
            ));
        } else {
            policy = policy.with_resume_timeout(Duration::from_secs(self.resume_timeout_secs));
        }
        (policy, issues)
    }

    pub fn agent_timeout(&self) -> Option<Duration> {
        (self.agent_timeout_secs > 0).then(|| Duration::from_secs(self.agent_timeout_secs))
    }

    pub fn aggregation_timeout(&self) -> Option<Duration> {
        (self.aggregation_timeout_secs > 0)
            .then(|| Duration::from_secs(self.aggregation_timeout_secs))
    }
}
