//! Protocol configuration from TOML (`[protocol]` section)

use sixhats_domain::{
    AgentInfo, ConfigIssue, ConfigIssueCode, PhaseSpec, ProtocolDefinition, Role,
};
use serde::{Deserialize, Serialize};

/// Raw protocol configuration from TOML
///
/// # Example
///
/// ```toml
/// [protocol]
/// name = "design_review"
/// version = "v2"
///
/// [[protocol.phases]]
/// role = "white"
///
/// [[protocol.phases.agents]]
/// agent_id = "white-analyst"
/// persona = "Data analyst"
/// model = "offline"
/// temperature = 0.2
/// ```
///
/// With no `phases` the built-in six thinking hats are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProtocolConfig {
    pub name: String,
    pub version: String,
    pub phases: Vec<FilePhaseConfig>,
}

impl Default for FileProtocolConfig {
    fn default() -> Self {
        Self {
            name: "six_thinking_hats".to_string(),
            version: "v1".to_string(),
            phases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePhaseConfig {
    pub role: String,
    #[serde(default)]
    pub agents: Vec<FileAgentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAgentConfig {
    pub agent_id: String,
    pub persona: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl FileProtocolConfig {
    /// Build the protocol, falling back to the six thinking hats on error.
    pub fn to_protocol(&self) -> (ProtocolDefinition, Vec<ConfigIssue>) {
        if self.phases.is_empty() {
            return (ProtocolDefinition::six_thinking_hats(), vec![]);
        }

        let mut issues = Vec::new();
        let phases = self
            .phases
            .iter()
            .map(|phase| {
                let agents = phase
                    .agents
                    .iter()
                    .map(|a| {
                        let mut agent = AgentInfo::new(&a.agent_id, &a.persona);
                        if let Some(model) = &a.model {
                            agent = agent.with_model(model);
                        }
                        if let Some(t) = a.temperature {
                            if (0.0..=2.0).contains(&t) {
                                agent = agent.with_temperature(t);
                            } else {
                                issues.push(ConfigIssue::warning(
                                    ConfigIssueCode::OutOfRange {
                                        field: format!("protocol.phases.agents.{}.temperature", a.agent_id),
                                        value: t.to_string(),
                                    },
                                    format!(
                                        "agent '{}': temperature {} outside 0.0..=2.0, using default",
                                        a.agent_id, t
                                    ),
                                ));
                            }
                        }
                        agent
                    })
                    .collect();
                PhaseSpec::new(Role::from(phase.role.as_str()), agents)
            })
            .collect();

        let protocol = ProtocolDefinition::new(&self.name, &self.version, phases);
        match protocol.validate() {
            Ok(()) => (protocol, issues),
            Err(e) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidProtocol,
                    format!("[protocol]: {e}"),
                ));
                (ProtocolDefinition::six_thinking_hats(), issues)
            }
        }
    }
}
