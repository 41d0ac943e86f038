// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process key-value backend with per-entry expiry.
//!
//! Expiry is measured with `tokio::time::Instant`, so paused-clock tests can
//! move past a retention window with `tokio::time::advance`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use shipwright_core::{AdapterType, HealthStatus, KvBackend, PluginAdapter, ShipwrightError};

struct Entry {
    value: String,
    /// `None` when the TTL is too large to represent as an instant.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// A `KvBackend` held entirely in memory. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for MemoryKv {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ShipwrightError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ShipwrightError> {
        Ok(())
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), ShipwrightError> {
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ShipwrightError> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, ShipwrightError> {
        let now = Instant::now();
        Ok(self
            .entries
            .write()
            .await
            .remove(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    async fn exists(&self, key: &str) -> Result<bool, ShipwrightError> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, ShipwrightError> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn purge_expired(&self) -> Result<usize, ShipwrightError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_vanish_after_ttl() {
        let kv = MemoryKv::new();
        kv.set_with_ttl("a", "1".into(), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("1"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(kv.get("a").await.unwrap(), None);
        assert!(!kv.exists("a").await.unwrap());
        // Still physically present until purged.
        assert_eq!(kv.len().await, 1);
        assert_eq!(kv.purge_expired().await.unwrap(), 1);
        assert!(kv.is_empty().await);
    }

    #[tokio::test]
    async fn prefix_scan_stops_at_prefix_boundary() {
        let kv = MemoryKv::new();
        let ttl = Duration::from_secs(60);
        for key in ["c:2", "c:1", "b:1", "d:1", "c;"] {
            kv.set_with_ttl(key, "v".into(), ttl).await.unwrap();
        }
        assert_eq!(kv.keys_with_prefix("c:").await.unwrap(), vec!["c:1", "c:2"]);
    }

    #[tokio::test]
    async fn huge_ttl_never_expires() {
        let kv = MemoryKv::new();
        kv.set_with_ttl("k", "v".into(), Duration::MAX).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(kv.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_reports_whether_live_entry_existed() {
        let kv = MemoryKv::new();
        kv.set_with_ttl("k", "v".into(), Duration::from_secs(60)).await.unwrap();
        assert!(kv.delete("k").await.unwrap());
        assert!(!kv.delete("k").await.unwrap());
    }
}
