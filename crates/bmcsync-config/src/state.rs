//! Persisted outputs of past reconciliation runs.
//!
//! `bmcsync.state.json` maps `power.<name>` / `bios.<name>` to the identity
//! and outputs recorded the last time that resource reconciled cleanly. A
//! failed resource keeps its previous entry. Resources that left the
//! manifest are dropped without touching the BMC.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConfigError;

const STATE_VERSION: u32 = 1;

/// Default state file, relative to the working directory.
pub fn default_state_path() -> PathBuf {
    PathBuf::from("bmcsync.state.json")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Power,
    Bios,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Bios => "bios",
        }
    }

    /// State key for resource `name`.
    pub fn key(self, name: &str) -> String {
        format!("{}.{name}", self.as_str())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last recorded outcome of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// External identity (`address + locator`).
    pub id: String,
    /// Output fields, as reported by the reconciler.
    pub outputs: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl State {
    /// Load from `path`; a missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file yet");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::State {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to `path` through a sibling temp file and a rename, so readers
    /// never see a half-written state.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::State {
            path: path.to_path_buf(),
            source,
        })?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), resources = self.resources.len(), "state saved");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    /// Replace the entry for `key` with a fresh outcome.
    pub fn record(&mut self, key: String, id: impl Into<String>, outputs: serde_json::Value) {
        self.resources.insert(
            key,
            ResourceState {
                id: id.into(),
                outputs,
                updated_at: Utc::now(),
            },
        );
    }

    /// Drop every entry not in `keep`. Returns the removed keys.
    pub fn prune(&mut self, keep: &BTreeSet<String>) -> Vec<String> {
        let removed: Vec<String> = self
            .resources
            .keys()
            .filter(|k| !keep.contains(*k))
            .cloned()
            .collect();
        for key in &removed {
            self.resources.remove(key);
        }
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(state, State::default());
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bmcsync.state.json");

        let mut state = State::default();
        state.record(
            ResourceKind::Power.key("node1"),
            "10.0.0.5/redfish/v1/Systems/1",
            json!({ "power_state": "On" }),
        );
        state.save(&path).unwrap();

        let loaded = State::load(&path).unwrap();
        assert_eq!(loaded, state);
        assert!(!dir.path().join("nested").join("bmcsync.state.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = State::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::State { .. }));
    }

    #[test]
    fn prune_forgets_undeclared_resources() {
        let mut state = State::default();
        state.record("power.node1".into(), "a", json!({}));
        state.record("bios.node1".into(), "b", json!({}));
        state.record("power.old".into(), "c", json!({}));

        let keep: BTreeSet<String> = ["power.node1", "bios.node1"]
            .into_iter()
            .map(String::from)
            .collect();
        let removed = state.prune(&keep);

        assert_eq!(removed, vec!["power.old".to_owned()]);
        assert!(state.get("power.old").is_none());
        assert_eq!(state.resources.len(), 2);
    }

    #[test]
    fn record_replaces_previous_entry() {
        let mut state = State::default();
        state.record("bios.node1".into(), "old", json!({ "id": "Bios" }));
        state.record("bios.node1".into(), "new", json!({ "id": "Bios" }));
        assert_eq!(state.get("bios.node1").unwrap().id, "new");
    }
}
