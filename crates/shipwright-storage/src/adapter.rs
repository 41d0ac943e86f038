// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `KvBackend` trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use shipwright_config::model::StorageConfig;
use shipwright_core::{AdapterType, HealthStatus, KvBackend, PluginAdapter, ShipwrightError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed key-value store.
///
/// The database is opened lazily by [`SqliteKv::initialize`]; every other
/// operation fails until then.
pub struct SqliteKv {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteKv {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Opens the database and runs migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), ShipwrightError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| ShipwrightError::storage("key-value store already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite key-value store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, ShipwrightError> {
        self.db
            .get()
            .ok_or_else(|| ShipwrightError::storage("key-value store not initialized"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteKv {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ShipwrightError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ShipwrightError> {
        if let Some(db) = self.db.get() {
            db.checkpoint_wal().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl KvBackend for SqliteKv {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), ShipwrightError> {
        queries::kv::set_with_ttl(self.db()?, key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ShipwrightError> {
        queries::kv::get(self.db()?, key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, ShipwrightError> {
        queries::kv::delete(self.db()?, key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, ShipwrightError> {
        queries::kv::exists(self.db()?, key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, ShipwrightError> {
        queries::kv::keys_with_prefix(self.db()?, prefix).await
    }

    async fn purge_expired(&self) -> Result<usize, ShipwrightError> {
        queries::kv::purge_expired(self.db()?).await
    }
}
