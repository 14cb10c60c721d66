//! Presentation layer for sixhats
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, and the interactive resume prompt.

pub mod cli;
pub mod output;
pub mod progress;
pub mod resume;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, HilModeArg, OutputFormat, ResumeActionArg};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
pub use resume::prompt::StdinResumePrompt;
