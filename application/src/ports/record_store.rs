//! Record store port
//!
//! Durable key/value persistence of one [`Workspace`] per run. `save` is an
//! idempotent full overwrite of `workspace:{run_id}`; `dead_letter` writes
//! `dead_letter:{run_id}` and leaves the live key alone.
//!
//! # Built-in Implementations
//!
//! - [`MemoryRecordStore`] - JSON strings in a map, for tests and one-shot runs
//!
//! The file-backed store lives in the infrastructure layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sixhats_domain::{RunId, RunStatus, Workspace};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Run not found: {0}")]
    NotFound(RunId),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Workspace {run_id} is corrupt: {reason}")]
    Corrupt { run_id: RunId, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Critical errors stop the run; `NotFound` is a caller mistake
    pub fn is_critical(&self) -> bool {
        !matches!(self, StoreError::NotFound(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Snapshot written under `dead_letter:{run_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub run_id: RunId,
    pub error_context: String,
    pub dead_lettered_at: DateTime<Utc>,
    pub workspace: Workspace,
}

impl DeadLetter {
    pub fn new(workspace: &Workspace, error_context: impl Into<String>) -> Self {
        Self {
            run_id: workspace.run_id().clone(),
            error_context: error_context.into(),
            dead_lettered_at: Utc::now(),
            workspace: workspace.clone(),
        }
    }
}

/// One line of `list_runs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub title: String,
    pub protocol: String,
    pub status: RunStatus,
    pub cursor: usize,
    pub phases: usize,
    pub updated_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn of(workspace: &Workspace) -> Self {
        let run = workspace.run();
        Self {
            run_id: run.run_id.clone(),
            title: workspace.scenario().title.clone(),
            protocol: run.protocol.clone(),
            status: run.status,
            cursor: run.cursor,
            phases: workspace.phases().len(),
            updated_at: run.updated_at,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load and validate the live workspace
    async fn load(&self, run_id: &RunId) -> Result<Workspace, StoreError>;

    /// Overwrite the live workspace
    async fn save(&self, workspace: &Workspace) -> Result<(), StoreError>;

    /// Write a dead-letter snapshot
    async fn dead_letter(&self, workspace: &Workspace, error_context: &str)
    -> Result<(), StoreError>;

    async fn load_dead_letter(&self, run_id: &RunId) -> Result<Option<DeadLetter>, StoreError>;

    /// Every live run, most recently updated first
    async fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError>;
}

/// Parse and validate a stored workspace
pub fn decode_workspace(run_id: &RunId, json: &str) -> Result<Workspace, StoreError> {
    let workspace: Workspace =
        serde_json::from_str(json).map_err(|e| StoreError::Corrupt {
            run_id: run_id.clone(),
            reason: e.to_string(),
        })?;
    if workspace.run_id() != run_id {
        return Err(StoreError::Corrupt {
            run_id: run_id.clone(),
            reason: format!("record belongs to run {}", workspace.run_id()),
        });
    }
    workspace.validate().map_err(|e| StoreError::Corrupt {
        run_id: run_id.clone(),
        reason: e.to_string(),
    })?;
    Ok(workspace)
}

pub fn encode_workspace(workspace: &Workspace) -> Result<String, StoreError> {
    serde_json::to_string_pretty(workspace).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// In-memory store keyed exactly like the durable one.
///
/// Values are kept as serialized JSON so loads go through the same
/// validation path as a real store.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Raw stored value, for byte-level comparisons
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.records.read().await.get(key).cloned()
    }

    /// Overwrite a raw value, bypassing validation
    pub async fn put_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.records.write().await.insert(key.into(), value.into());
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load(&self, run_id: &RunId) -> Result<Workspace, StoreError> {
        self.check_available()?;
        let records = self.records.read().await;
        let json = records
            .get(&run_id.workspace_key())
            .ok_or_else(|| StoreError::NotFound(run_id.clone()))?;
        decode_workspace(run_id, json)
    }

    async fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        self.check_available()?;
        let json = encode_workspace(workspace)?;
        self.records
            .write()
            .await
            .insert(workspace.run_id().workspace_key(), json);
        Ok(())
    }

    async fn dead_letter(
        &self,
        workspace: &Workspace,
        error_context: &str,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let record = DeadLetter::new(workspace, error_context);
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.records
            .write()
            .await
            .insert(workspace.run_id().dead_letter_key(), json);
        Ok(())
    }

    async fn load_dead_letter(&self, run_id: &RunId) -> Result<Option<DeadLetter>, StoreError> {
        self.check_available()?;
        let records = self.records.read().await;
        match records.get(&run_id.dead_letter_key()) {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    run_id: run_id.clone(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        self.check_available()?;
        let records = self.records.read().await;
        let mut runs = Vec::new();
        for (key, json) in records.iter() {
            let Some(id) = key.strip_prefix("workspace:") else {
                continue;
            };
            match decode_workspace(&RunId::new(id), json) {
                Ok(workspace) => runs.push(RunSummary::of(&workspace)),
                Err(e) => tracing::warn!(run_id = id, "Skipping unreadable workspace: {}", e),
            }
        }
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(runs)
    }
}
