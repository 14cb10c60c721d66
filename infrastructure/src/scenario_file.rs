//! Scenario files: TOML or JSON, chosen by extension.
//!
//! ```toml
//! title = "Adopt Rust"
//! problem_statement = "Should the payments service move to Rust?"
//! objectives = ["Lower p99 latency"]
//! constraints = ["No downtime"]
//! ```

use sixhats_domain::Scenario;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioFileError {
    #[error("Cannot read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse scenario {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid scenario {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Read and validate a scenario file. `.json` is parsed as JSON, anything
/// else as TOML.
pub async fn load_scenario(path: &Path) -> Result<Scenario, ScenarioFileError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScenarioFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_scenario(path, &text)
}

fn parse_scenario(path: &Path, text: &str) -> Result<Scenario, ScenarioFileError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let parsed: Result<Scenario, String> = if is_json {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        toml::from_str(text).map_err(|e| e.to_string())
    };
    let scenario = parsed.map_err(|reason| ScenarioFileError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;

    scenario
        .validate()
        .map_err(|e| ScenarioFileError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(scenario)
}
