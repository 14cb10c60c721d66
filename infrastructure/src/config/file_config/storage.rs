//! Storage configuration from TOML (`[store]` and `[audit]` sections)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where workspaces and dead letters are written
///
/// ```toml
/// [store]
/// dir = "~/.local/share/sixhats/runs"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    pub dir: Option<String>,
}

impl FileStoreConfig {
    /// Configured directory, else `$XDG_DATA_HOME/sixhats/runs`, else
    /// `./.sixhats/runs`
    pub fn resolve_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => expand_home(dir),
            None => dirs::data_dir()
                .map(|d| d.join("sixhats").join("runs"))
                .unwrap_or_else(|| PathBuf::from(".sixhats").join("runs")),
        }
    }
}

/// JSONL audit trail
///
/// ```toml
/// [audit]
/// enabled = true
/// jsonl_path = "audit.jsonl"   # default: <store.dir>/audit.jsonl
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    pub enabled: bool,
    pub jsonl_path: Option<String>,
}

impl Default for FileAuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jsonl_path: None,
        }
    }
}

impl FileAuditConfig {
    pub fn resolve_path(&self, store_dir: &std::path::Path) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        Some(match &self.jsonl_path {
            Some(path) => expand_home(path),
            None => store_dir.join("audit.jsonl"),
        })
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}
