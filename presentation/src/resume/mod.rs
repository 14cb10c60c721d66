//! Human resume prompt

pub mod prompt;
