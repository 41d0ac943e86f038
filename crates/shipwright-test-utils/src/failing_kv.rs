// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value backend that fails every operation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use shipwright_core::{AdapterType, HealthStatus, KvBackend, PluginAdapter, ShipwrightError};

/// A `KvBackend` standing in for an unreachable store.
#[derive(Default)]
pub struct FailingKv {
    attempts: AtomicUsize,
}

impl FailingKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many operations were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, ShipwrightError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ShipwrightError::storage("backend unavailable"))
    }
}

#[async_trait]
impl PluginAdapter for FailingKv {
    fn name(&self) -> &str {
        "failing"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ShipwrightError> {
        Ok(HealthStatus::Unhealthy("backend unavailable".into()))
    }

    async fn shutdown(&self) -> Result<(), ShipwrightError> {
        Ok(())
    }
}

#[async_trait]
impl KvBackend for FailingKv {
    async fn set_with_ttl(&self, _: &str, _: String, _: Duration) -> Result<(), ShipwrightError> {
        self.fail()
    }

    async fn get(&self, _: &str) -> Result<Option<String>, ShipwrightError> {
        self.fail()
    }

    async fn delete(&self, _: &str) -> Result<bool, ShipwrightError> {
        self.fail()
    }

    async fn exists(&self, _: &str) -> Result<bool, ShipwrightError> {
        self.fail()
    }

    async fn keys_with_prefix(&self, _: &str) -> Result<Vec<String>, ShipwrightError> {
        self.fail()
    }

    async fn purge_expired(&self) -> Result<usize, ShipwrightError> {
        self.fail()
    }
}
