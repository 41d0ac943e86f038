// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool execution gateway trait.

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::types::{ToolDefinition, ToolOutcome};

/// Runs named tools against the run's isolated workspace.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// The tool catalog offered to the LLM.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Executes one tool call. An `Err` is fed back to the model as an
    /// error-flagged tool result; it never ends the run by itself.
    async fn execute(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<ToolOutcome, ShipwrightError>;
}
