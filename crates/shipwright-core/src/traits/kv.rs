// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value backend trait with per-entry expiry.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::traits::adapter::PluginAdapter;

/// String key-value storage where every entry carries a time-to-live.
///
/// Expired entries must be invisible to `get`, `exists`, and
/// `keys_with_prefix` even before they are physically removed.
#[async_trait]
pub trait KvBackend: PluginAdapter {
    /// Writes `value` under `key`, replacing any previous value and
    /// resetting the expiry to `now + ttl`.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), ShipwrightError>;

    async fn get(&self, key: &str) -> Result<Option<String>, ShipwrightError>;

    /// Removes `key`. Returns whether an entry was present.
    async fn delete(&self, key: &str) -> Result<bool, ShipwrightError>;

    async fn exists(&self, key: &str) -> Result<bool, ShipwrightError>;

    /// All live keys starting with `prefix`, sorted.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, ShipwrightError>;

    /// Physically removes expired entries. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, ShipwrightError>;
}
