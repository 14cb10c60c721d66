//! Configuration file loading for sixhats
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SIXHATS_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./sixhats.toml` or `./.sixhats.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/sixhats/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAgentConfig, FileAuditConfig, FileConfig, FileOrchestratorConfig, FileOutputConfig,
    FilePhaseConfig, FileProtocolConfig, FileRetryConfig, FileStoreConfig,
};
pub use loader::ConfigLoader;
