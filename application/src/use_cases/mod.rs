//! Use cases
//!
//! Application-level operations that drive the domain state machine.

pub mod aggregate;
pub mod orchestrate;
pub mod retry;
pub mod run_phase;

#[cfg(test)]
pub(crate) mod test_support;
