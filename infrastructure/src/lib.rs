//! Infrastructure layer for sixhats
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod offline;
pub mod scenario_file;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig, FileOutputConfig};
pub use logging::{JsonlAuditSink, TracingAuditSink};
pub use offline::{OfflineAgent, OfflineReducer};
pub use scenario_file::{ScenarioFileError, load_scenario};
pub use store::FileRecordStore;
