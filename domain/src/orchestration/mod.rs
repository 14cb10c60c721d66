//! Run orchestration rules
//!
//! The lifecycle of a run as a pure state machine, plus the human-in-the-loop
//! policy it consults. The application layer drives it.

pub mod policy;
pub mod state_machine;
