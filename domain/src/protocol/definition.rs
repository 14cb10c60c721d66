//! Protocol definition - the ordered list of roles and who plays them.
//!
//! The orchestrator knows nothing about a protocol beyond this structure:
//! an ordered sequence of [`PhaseSpec`]s, each naming a [`Role`] and the
//! agent set to invoke for it.

use super::role::Role;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identity and persona of an agent participating in a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub agent_id: String,
    pub persona: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

impl AgentInfo {
    pub fn new(agent_id: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            persona: persona.into(),
            model: String::new(),
            temperature: default_temperature(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Identity used for human-authored contributions
    pub fn human(actor: impl Into<String>) -> Self {
        let actor = actor.into();
        Self {
            agent_id: actor.clone(),
            persona: format!("human:{actor}"),
            model: "human".to_string(),
            temperature: 0.0,
        }
    }
}

/// One phase of a protocol: a role and the agents that contribute to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub role: Role,
    pub agents: Vec<AgentInfo>,
}

impl PhaseSpec {
    pub fn new(role: Role, agents: Vec<AgentInfo>) -> Self {
        Self { role, agents }
    }
}

/// Ordered protocol definition (injected role -> agent set mapping)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDefinition {
    pub name: String,
    pub version: String,
    pub phases: Vec<PhaseSpec>,
}

impl ProtocolDefinition {
    pub fn new(name: impl Into<String>, version: impl Into<String>, phases: Vec<PhaseSpec>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            phases,
        }
    }

    /// Six thinking hats with one agent per hat
    pub fn six_thinking_hats() -> Self {
        let phases = Role::six_hats()
            .into_iter()
            .map(|role| {
                let agent = AgentInfo::new(
                    format!("{}-hat-001", role.as_str()),
                    format!("{} Thinker", role.display_name()),
                );
                PhaseSpec::new(role, vec![agent])
            })
            .collect();
        Self::new("six_thinking_hats", "v1", phases)
    }

    /// `name:version`, stored on the run and used to version persisted records
    pub fn id(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    pub fn roles(&self) -> Vec<Role> {
        self.phases.iter().map(|p| p.role.clone()).collect()
    }

    pub fn phase(&self, index: usize) -> Option<&PhaseSpec> {
        self.phases.get(index)
    }

    pub fn agents_for(&self, role: &Role) -> Option<&[AgentInfo]> {
        self.phases
            .iter()
            .find(|p| &p.role == role)
            .map(|p| p.agents.as_slice())
    }

    /// Validate structure: at least one phase, unique roles, non-empty and
    /// uniquely named agent sets.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidProtocol(
                "protocol name is empty".to_string(),
            ));
        }
        if self.phases.is_empty() {
            return Err(DomainError::InvalidProtocol(
                "protocol defines no phases".to_string(),
            ));
        }

        let mut roles = HashSet::new();
        for phase in &self.phases {
            if !roles.insert(&phase.role) {
                return Err(DomainError::InvalidProtocol(format!(
                    "role '{}' appears more than once",
                    phase.role
                )));
            }
            if phase.agents.is_empty() {
                return Err(DomainError::InvalidProtocol(format!(
                    "role '{}' has no agents",
                    phase.role
                )));
            }
            let mut ids = HashSet::new();
            for agent in &phase.agents {
                if !ids.insert(agent.agent_id.as_str()) {
                    return Err(DomainError::InvalidProtocol(format!(
                        "agent '{}' listed twice for role '{}'",
                        agent.agent_id, phase.role
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ProtocolDefinition {
    fn default() -> Self {
        Self::six_thinking_hats()
    }
}
