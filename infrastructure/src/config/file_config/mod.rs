//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types with
//! any problems reported as [`ConfigIssue`]s.

mod orchestrator;
mod output;
mod protocol;
mod retry;
mod storage;

pub use orchestrator::FileOrchestratorConfig;
pub use output::FileOutputConfig;
pub use protocol::{FileAgentConfig, FilePhaseConfig, FileProtocolConfig};
pub use retry::FileRetryConfig;
pub use storage::{FileAuditConfig, FileStoreConfig};

use serde::{Deserialize, Serialize};
use sixhats_application::OrchestratorConfig;
use sixhats_domain::{ConfigIssue, ConfigIssueCode, ProtocolDefinition};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub protocol: FileProtocolConfig,
    pub retry: FileRetryConfig,
    pub orchestrator: FileOrchestratorConfig,
    pub store: FileStoreConfig,
    pub audit: FileAuditConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.protocol.to_protocol().1);
        issues.extend(self.retry.to_retry_policy().1);
        issues.extend(self.orchestrator.to_hil_policy().1);

        if self.orchestrator.fallback_key_points == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "orchestrator.fallback_key_points".to_string(),
                    value: "0".to_string(),
                },
                "orchestrator.fallback_key_points: 0 leaves fallback syntheses without key points",
            ));
        }

        issues
    }

    pub fn protocol(&self) -> ProtocolDefinition {
        self.protocol.to_protocol().0
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_retry(self.retry.to_retry_policy().0)
            .with_agent_timeout(self.orchestrator.agent_timeout())
            .with_aggregation_timeout(self.orchestrator.aggregation_timeout())
            .with_fallback_key_points(self.orchestrator.fallback_key_points)
            .with_hil(self.orchestrator.to_hil_policy().0)
    }
}
