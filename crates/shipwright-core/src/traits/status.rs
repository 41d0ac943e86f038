// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lookup into the external job system's view of a run.

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::types::RunStatus;

#[async_trait]
pub trait RunStatusLookup: Send + Sync {
    async fn status(&self, run_id: &str) -> Result<RunStatus, ShipwrightError>;
}
