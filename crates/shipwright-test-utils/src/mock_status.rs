// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run-status lookup with fixed answers.

use std::collections::HashMap;

use async_trait::async_trait;

use shipwright_core::{RunStatus, RunStatusLookup, ShipwrightError};

/// Answers from a fixed map; unlisted runs are `Unknown`. A failing lookup
/// returns a provider-style error for every query.
#[derive(Default)]
pub struct StaticStatusLookup {
    statuses: HashMap<String, RunStatus>,
    failure: Option<String>,
}

impl StaticStatusLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, run_id: &str, status: RunStatus) -> Self {
        self.statuses.insert(run_id.to_string(), status);
        self
    }

    /// A lookup that fails every query with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            statuses: HashMap::new(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl RunStatusLookup for StaticStatusLookup {
    async fn status(&self, run_id: &str) -> Result<RunStatus, ShipwrightError> {
        if let Some(message) = &self.failure {
            return Err(ShipwrightError::Internal(message.clone()));
        }
        Ok(self
            .statuses
            .get(run_id)
            .copied()
            .unwrap_or(RunStatus::Unknown))
    }
}
