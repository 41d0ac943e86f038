// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of the checkpoint store from configuration.

use std::sync::Arc;

use tracing::{debug, warn};

use shipwright_checkpoint::{CheckpointStore, MemoryKv};
use shipwright_config::ShipwrightConfig;
use shipwright_config::model::CheckpointBackendKind;
use shipwright_core::{KvBackend, ShipwrightError};
use shipwright_storage::SqliteKv;

/// Open the configured key-value backend and wrap it in a checkpoint store.
pub async fn open_store(config: &ShipwrightConfig) -> Result<CheckpointStore, ShipwrightError> {
    let backend: Arc<dyn KvBackend> = match config.checkpoint.backend {
        CheckpointBackendKind::Sqlite => {
            let kv = SqliteKv::new(config.storage.clone());
            kv.initialize().await?;
            debug!(path = %config.storage.database_path, "opened sqlite checkpoint backend");
            Arc::new(kv)
        }
        CheckpointBackendKind::Memory => {
            warn!("memory checkpoint backend holds nothing across processes");
            Arc::new(MemoryKv::new())
        }
    };
    Ok(CheckpointStore::from_config(backend, &config.checkpoint))
}
