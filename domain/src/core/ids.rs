//! Identifier value objects

use serde::{Deserialize, Serialize};

/// Unique identifier for a run.
///
/// Every workspace is keyed by its run id in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a RunId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random RunId.
    pub fn generate() -> Self {
        Self(new_id())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Record store key for the live workspace of this run.
    pub fn workspace_key(&self) -> String {
        format!("workspace:{}", self.0)
    }

    /// Record store key for the dead-lettered snapshot of this run.
    pub fn dead_letter_key(&self) -> String {
        format!("dead_letter:{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a fresh random identifier (UUID v4, hyphenated).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RunId::generate(), RunId::generate());
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_store_keys() {
        let id = RunId::new("abc");
        assert_eq!(id.workspace_key(), "workspace:abc");
        assert_eq!(id.dead_letter_key(), "dead_letter:abc");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&RunId::new("r-1")).unwrap();
        assert_eq!(json, "\"r-1\"");
    }
}
