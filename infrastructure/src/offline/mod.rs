//! Offline agent and reducer.
//!
//! Model-free implementations of the agent and reduction ports. They let
//! the CLI run a full protocol without network access and give integration
//! tests a realistic, reproducible engine.

mod agent;
mod reducer;

pub use agent::OfflineAgent;
pub use reducer::OfflineReducer;
