// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool gateway that records executions and replies with canned outcomes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use shipwright_core::{ShipwrightError, ToolDefinition, ToolGateway, ToolOutcome};

#[derive(Debug, Clone)]
enum Behavior {
    Output(String),
    Fail(String),
    Complete {
        summary: String,
        pull_request_url: Option<String>,
    },
}

/// A tool gateway with fixed per-tool behavior.
///
/// Only registered tools appear in `definitions()`. Unregistered names fail
/// with "Unknown tool: {name}", as the real registry does.
pub struct RecordingTools {
    behaviors: HashMap<String, Behavior>,
    executions: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingTools {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            executions: Mutex::new(Vec::new()),
        }
    }

    /// `name` returns `output`.
    pub fn with_output(mut self, name: &str, output: impl Into<String>) -> Self {
        self.behaviors
            .insert(name.to_string(), Behavior::Output(output.into()));
        self
    }

    /// `name` fails with a tool error carrying `message`.
    pub fn with_failure(mut self, name: &str, message: impl Into<String>) -> Self {
        self.behaviors
            .insert(name.to_string(), Behavior::Fail(message.into()));
        self
    }

    /// `name` reports task completion.
    pub fn with_completion(
        mut self,
        name: &str,
        summary: impl Into<String>,
        pull_request_url: Option<&str>,
    ) -> Self {
        self.behaviors.insert(
            name.to_string(),
            Behavior::Complete {
                summary: summary.into(),
                pull_request_url: pull_request_url.map(str::to_string),
            },
        );
        self
    }

    /// `(tool name, input)` for every execution, in call order.
    pub async fn executions(&self) -> Vec<(String, serde_json::Value)> {
        self.executions.lock().await.clone()
    }

    pub async fn executed_names(&self) -> Vec<String> {
        self.executions
            .lock()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl Default for RecordingTools {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolGateway for RecordingTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .behaviors
            .keys()
            .map(|name| ToolDefinition {
                name: name.clone(),
                description: format!("mock tool {name}"),
                input_schema: serde_json::json!({"type": "object"}),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    async fn execute(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<ToolOutcome, ShipwrightError> {
        self.executions
            .lock()
            .await
            .push((name.to_string(), input));

        match self.behaviors.get(name).cloned() {
            Some(Behavior::Output(output)) => Ok(ToolOutcome::Output(output)),
            Some(Behavior::Fail(message)) => Err(ShipwrightError::Tool {
                tool: name.to_string(),
                message,
            }),
            Some(Behavior::Complete {
                summary,
                pull_request_url,
            }) => Ok(ToolOutcome::Complete {
                summary,
                pull_request_url,
            }),
            None => Err(ShipwrightError::Tool {
                tool: name.to_string(),
                message: format!("Unknown tool: {name}"),
            }),
        }
    }
}
