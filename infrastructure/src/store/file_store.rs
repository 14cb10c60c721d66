//! File-backed record store.
//!
//! Layout under the store directory:
//!
//! ```text
//! <dir>/<run_id>.json              workspace:<run_id>
//! <dir>/dead_letter/<run_id>.json  dead_letter:<run_id>
//! ```
//!
//! Every write goes to a `.tmp` sibling first and is renamed into place, so
//! a reader never sees a half-written workspace.

use async_trait::async_trait;
use sixhats_application::ports::record_store::{decode_workspace, encode_workspace};
use sixhats_application::{DeadLetter, RecordStore, RunSummary, StoreError};
use sixhats_domain::{RunId, Workspace};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DEAD_LETTER_DIR: &str = "dead_letter";

pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn workspace_path(&self, run_id: &RunId) -> Result<PathBuf, StoreError> {
        Ok(self.dir.join(file_name(run_id)?))
    }

    fn dead_letter_path(&self, run_id: &RunId) -> Result<PathBuf, StoreError> {
        Ok(self.dir.join(DEAD_LETTER_DIR).join(file_name(run_id)?))
    }
}

/// Run ids become file names; anything that could escape the directory is
/// treated as unknown.
fn file_name(run_id: &RunId) -> Result<String, StoreError> {
    let id = run_id.as_str();
    let safe = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !safe {
        return Err(StoreError::NotFound(run_id.clone()));
    }
    Ok(format!("{id}.json"))
}

fn unavailable(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", path.display(), e))
}

async fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| unavailable(parent, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| unavailable(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| unavailable(path, e))
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn load(&self, run_id: &RunId) -> Result<Workspace, StoreError> {
        let path = self.workspace_path(run_id)?;
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(run_id.clone()));
            }
            Err(e) => return Err(unavailable(&path, e)),
        };
        decode_workspace(run_id, &json)
    }

    async fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let path = self.workspace_path(workspace.run_id())?;
        let json = encode_workspace(workspace)?;
        write_atomic(&path, &json).await?;
        debug!(
            run_id = %workspace.run_id(),
            status = %workspace.status(),
            "Saved workspace to {}",
            path.display()
        );
        Ok(())
    }

    async fn dead_letter(
        &self,
        workspace: &Workspace,
        error_context: &str,
    ) -> Result<(), StoreError> {
        let path = self.dead_letter_path(workspace.run_id())?;
        let letter = DeadLetter::new(workspace, error_context);
        let json = serde_json::to_string_pretty(&letter)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&path, &json).await?;
        warn!(run_id = %workspace.run_id(), "Dead letter written to {}", path.display());
        Ok(())
    }

    async fn load_dead_letter(&self, run_id: &RunId) -> Result<Option<DeadLetter>, StoreError> {
        let path = self.dead_letter_path(run_id)?;
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unavailable(&path, e)),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                run_id: run_id.clone(),
                reason: format!("dead letter: {e}"),
            })
    }

    async fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(unavailable(&self.dir, e)),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| unavailable(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let run_id = RunId::new(stem);
            match self.load(&run_id).await {
                Ok(workspace) => runs.push(RunSummary::of(&workspace)),
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sixhats_domain::{ProtocolDefinition, RunStatus, Scenario};

    fn workspace(title: &str) -> Workspace {
        Workspace::new(
            Scenario::new(title, "Is it worth it?"),
            &ProtocolDefinition::six_thinking_hats(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        let ws = workspace("Adopt Rust");

        store.save(&ws).await.unwrap();
        assert_eq!(store.load(ws.run_id()).await.unwrap(), ws);

        let file = dir.path().join(format!("{}.json", ws.run_id()));
        assert!(file.exists());
        assert!(!file.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_run_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        let err = store.load(&RunId::new("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_path_like_ids_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        let err = store.load(&RunId::new("../etc/passwd")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        let ws = workspace("Adopt Rust");
        store.save(&ws).await.unwrap();

        let path = dir.path().join(format!("{}.json", ws.run_id()));
        std::fs::write(&path, "{ not json").unwrap();

        let err = store.load(ws.run_id()).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(err.is_critical());
    }

    #[tokio::test]
    async fn test_dead_letter_leaves_live_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        let ws = workspace("Adopt Rust");
        store.save(&ws).await.unwrap();

        assert!(store.load_dead_letter(ws.run_id()).await.unwrap().is_none());
        store.dead_letter(&ws, "all_agents_failed: black").await.unwrap();

        let letter = store.load_dead_letter(ws.run_id()).await.unwrap().unwrap();
        assert_eq!(letter.error_context, "all_agents_failed: black");
        assert_eq!(letter.workspace, ws);
        assert!(dir.path().join(DEAD_LETTER_DIR).is_dir());
        assert_eq!(store.load(ws.run_id()).await.unwrap(), ws);
    }

    #[tokio::test]
    async fn test_list_runs_skips_dead_letters_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        assert!(store.list_runs().await.unwrap().is_empty());

        let first = workspace("First");
        let second = workspace("Second");
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();
        store.dead_letter(&first, "x").await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("broken.json"), "[]").unwrap();

        let runs = store.list_runs().await.unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|r| r.status == RunStatus::Pending));
        assert!(runs.iter().any(|r| r.title == "Second"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_unavailable_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let store = FileRecordStore::new(blocker.join("runs"));

        let err = store.save(&workspace("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
