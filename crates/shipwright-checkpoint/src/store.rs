// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkpoint store over a key-value backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use shipwright_config::model::CheckpointConfig;
use shipwright_core::{KvBackend, RunState, ShipwrightError};

use crate::record::{Checkpoint, CheckpointMetadata, SCHEMA_VERSION};

/// Persists run-state snapshots keyed by run ID.
///
/// `save`, `load`, `delete` and `exists` never return errors: backend
/// failures are logged and the call degrades to "nothing stored".
#[derive(Clone)]
pub struct CheckpointStore {
    backend: Arc<dyn KvBackend>,
    key_prefix: String,
    ttl: Duration,
}

impl CheckpointStore {
    pub fn new(backend: Arc<dyn KvBackend>, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            backend,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    pub fn from_config(backend: Arc<dyn KvBackend>, config: &CheckpointConfig) -> Self {
        Self::new(backend, config.key_prefix.clone(), config.ttl())
    }

    /// Storage key for `run_id`.
    pub fn key(&self, run_id: &str) -> String {
        format!("{}{run_id}", self.key_prefix)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Write a snapshot of `state`, replacing any previous one and
    /// restarting the retention window.
    pub async fn save(&self, run_id: &str, state: &RunState) {
        let record = Checkpoint::capture(state, Utc::now());
        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(run_id, error = %e, "failed to serialize checkpoint");
                return;
            }
        };

        match self.backend.set_with_ttl(&self.key(run_id), payload, self.ttl).await {
            Ok(()) => debug!(
                run_id,
                turns_completed = state.turns_completed,
                messages = state.messages.len(),
                "checkpoint saved"
            ),
            Err(e) => warn!(run_id, error = %e, "failed to save checkpoint"),
        }
    }

    /// The stored checkpoint for `run_id`, if one exists and is readable
    /// under the current schema version.
    pub async fn load(&self, run_id: &str) -> Option<Checkpoint> {
        let raw = match self.backend.get(&self.key(run_id)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(run_id, error = %e, "failed to read checkpoint");
                return None;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(run_id, error = %e, "discarding unreadable checkpoint");
                return None;
            }
        };

        let stored_version = value.get("schemaVersion").and_then(serde_json::Value::as_u64);
        if stored_version != Some(u64::from(SCHEMA_VERSION)) {
            warn!(
                run_id,
                stored_version = ?stored_version,
                expected_version = SCHEMA_VERSION,
                "checkpoint schema version mismatch, ignoring"
            );
            return None;
        }

        match serde_json::from_value::<Checkpoint>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(run_id, error = %e, "discarding malformed checkpoint");
                None
            }
        }
    }

    /// Remove the checkpoint for `run_id`. Absent entries are not an error.
    pub async fn delete(&self, run_id: &str) {
        match self.backend.delete(&self.key(run_id)).await {
            Ok(removed) => debug!(run_id, removed, "checkpoint deleted"),
            Err(e) => warn!(run_id, error = %e, "failed to delete checkpoint"),
        }
    }

    pub async fn exists(&self, run_id: &str) -> bool {
        self.backend
            .exists(&self.key(run_id))
            .await
            .unwrap_or_else(|e| {
                warn!(run_id, error = %e, "failed to check checkpoint existence");
                false
            })
    }

    /// Run IDs of all unexpired checkpoints, sorted.
    pub async fn list_active(&self) -> Result<Vec<String>, ShipwrightError> {
        let keys = self.backend.keys_with_prefix(&self.key_prefix).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.key_prefix).map(str::to_string))
            .collect())
    }

    pub async fn metadata(&self, run_id: &str) -> Option<CheckpointMetadata> {
        self.load(run_id).await.map(|record| record.metadata())
    }

    /// Physically remove expired entries from the backend.
    pub async fn prune_expired(&self) -> Result<usize, ShipwrightError> {
        let removed = self.backend.purge_expired().await?;
        info!(removed, "pruned expired checkpoints");
        Ok(removed)
    }
}

impl std::fmt::Debug for CheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointStore")
            .field("backend", &self.backend.name())
            .field("key_prefix", &self.key_prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKv;
    use shipwright_core::{ContentBlock, Message, WorkspaceConfig};

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn store() -> (Arc<MemoryKv>, CheckpointStore) {
        let kv = Arc::new(MemoryKv::new());
        let store = CheckpointStore::new(kv.clone(), "checkpoint:", WEEK);
        (kv, store)
    }

    fn state(run_id: &str) -> RunState {
        RunState::new(
            run_id,
            "ws-1",
            "Add a changelog entry",
            WorkspaceConfig {
                owner: "acme".into(),
                repo: "widgets".into(),
                default_branch: "main".into(),
            },
            5,
        )
    }

    #[tokio::test]
    async fn second_save_overwrites_first() {
        let (kv, store) = store();
        let mut s = state("run-1");
        store.save("run-1", &s).await;

        s.messages.push(Message::assistant(vec![ContentBlock::text("working")], None));
        s.turns_completed = 1;
        store.save("run-1", &s).await;

        assert_eq!(kv.len().await, 1);
        let loaded = store.load("run-1").await.unwrap();
        assert_eq!(loaded.turns_completed, 1);
        assert_eq!(loaded.messages.len(), 2);
    }

    #[tokio::test]
    async fn missing_checkpoint_loads_as_none() {
        let (_, store) = store();
        assert!(store.load("nope").await.is_none());
        assert!(store.metadata("nope").await.is_none());
        assert!(!store.exists("nope").await);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, store) = store();
        store.save("run-1", &state("run-1")).await;
        assert!(store.exists("run-1").await);
        store.delete("run-1").await;
        store.delete("run-1").await;
        assert!(!store.exists("run-1").await);
    }

    #[tokio::test]
    async fn version_mismatch_is_treated_as_absent() {
        let (kv, store) = store();
        store.save("run-1", &state("run-1")).await;

        let raw = kv.get("checkpoint:run-1").await.unwrap().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value["schemaVersion"] = serde_json::json!(SCHEMA_VERSION + 1);
        kv.set_with_ttl("checkpoint:run-1", value.to_string(), WEEK)
            .await
            .unwrap();

        assert!(store.load("run-1").await.is_none());
        // The entry itself is left in place.
        assert!(store.exists("run-1").await);
    }

    #[tokio::test]
    async fn malformed_payloads_are_treated_as_absent() {
        let (kv, store) = store();
        kv.set_with_ttl("checkpoint:garbage", "{not json".into(), WEEK)
            .await
            .unwrap();
        kv.set_with_ttl(
            "checkpoint:partial",
            format!(r#"{{"schemaVersion": {SCHEMA_VERSION}, "runId": "partial"}}"#),
            WEEK,
        )
        .await
        .unwrap();

        assert!(store.load("garbage").await.is_none());
        assert!(store.load("partial").await.is_none());
    }

    #[tokio::test]
    async fn list_active_strips_prefix_and_ignores_foreign_keys() {
        let (kv, store) = store();
        store.save("run-b", &state("run-b")).await;
        store.save("run-a", &state("run-a")).await;
        kv.set_with_ttl("session:xyz", "{}".into(), WEEK).await.unwrap();

        assert_eq!(store.list_active().await.unwrap(), vec!["run-a", "run-b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoints_expire_after_retention_window() {
        let (_, store) = store();
        store.save("run-1", &state("run-1")).await;

        tokio::time::advance(WEEK - Duration::from_secs(1)).await;
        // Rewriting refreshes the window.
        store.save("run-1", &state("run-1")).await;
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.exists("run-1").await);

        tokio::time::advance(WEEK).await;
        assert!(!store.exists("run-1").await);
        assert!(store.list_active().await.unwrap().is_empty());
        assert_eq!(store.prune_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn metadata_reflects_stored_progress() {
        let (_, store) = store();
        let mut s = state("run-1");
        s.turns_completed = 2;
        store.save("run-1", &s).await;

        let meta = store.metadata("run-1").await.unwrap();
        assert_eq!(meta.turns_completed, 2);
        assert!(meta.can_resume);
    }
}
