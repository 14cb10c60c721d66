//! Protocol domain - roles and the ordered phase definition

pub mod definition;
pub mod role;

pub use definition::{AgentInfo, PhaseSpec, ProtocolDefinition};
pub use role::Role;
