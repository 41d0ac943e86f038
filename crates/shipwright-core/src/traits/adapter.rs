// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by every adapter.

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::types::{AdapterType, HealthStatus};

/// Identity and lifecycle hooks common to all adapters.
#[async_trait]
pub trait PluginAdapter: Send + Sync {
    /// Human-readable adapter name (e.g. "sqlite", "anthropic").
    fn name(&self) -> &str;

    /// Adapter implementation version.
    fn version(&self) -> semver::Version;

    /// Which seam this adapter plugs into.
    fn adapter_type(&self) -> AdapterType;

    /// Reports whether the adapter can currently serve requests.
    async fn health_check(&self) -> Result<HealthStatus, ShipwrightError>;

    /// Releases resources held by the adapter.
    async fn shutdown(&self) -> Result<(), ShipwrightError>;
}
