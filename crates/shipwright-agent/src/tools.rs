// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, name-indexed registry, and the built-in task-complete tool.
//!
//! [`ToolRegistry`] implements [`ToolGateway`], so the agent loop can run
//! against a registry directly or against any other gateway implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use shipwright_core::{ShipwrightError, ToolDefinition, ToolGateway, ToolOutcome};

/// Name of the tool that ends a run successfully.
pub const TASK_COMPLETE_TOOL: &str = "task_complete";

/// A capability the LLM may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in the LLM's tool catalog.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the tool's input.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ShipwrightError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// A registry preloaded with [`TaskCompleteTool`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TaskCompleteTool));
        registry
    }

    /// Registers a tool under its `name()`, replacing any tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolGateway for ToolRegistry {
    /// Definitions sorted by name so the catalog is stable across calls.
    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.parameters_schema(),
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
        let tool = self.get(name).ok_or_else(|| ShipwrightError::Tool {
            tool: name.to_string(),
            message: format!("Unknown tool: {name}"),
        })?;
        debug!(tool = name, "invoking tool");
        tool.invoke(input).await
    }
}

#[derive(Deserialize)]
struct TaskCompleteInput {
    summary: String,
    #[serde(default)]
    pull_request_url: Option<String>,
}

/// Signals that the task is finished. Ends the run with the given summary.
pub struct TaskCompleteTool;

#[async_trait]
impl Tool for TaskCompleteTool {
    fn name(&self) -> &str {
        TASK_COMPLETE_TOOL
    }

    fn description(&self) -> &str {
        "Call when the task is finished. Provide a summary of the changes and, if one was opened, the pull request URL."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "What was done"
                },
                "pull_request_url": {
                    "type": "string",
                    "description": "URL of the pull request, if any"
                }
            },
            "required": ["summary"]
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ShipwrightError> {
        let input: TaskCompleteInput =
            serde_json::from_value(input).map_err(|e| ShipwrightError::Tool {
                tool: TASK_COMPLETE_TOOL.to_string(),
                message: format!("invalid input: {e}"),
            })?;
        Ok(ToolOutcome::Complete {
            summary: input.summary,
            pull_request_url: input.pull_request_url.filter(|url| !url.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input text"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ShipwrightError> {
            let text = input["text"].as_str().unwrap_or("").to_string();
            Ok(ToolOutcome::Output(text))
        }
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let mut registry = ToolRegistry::with_builtins();
        registry.register(Arc::new(EchoTool));
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "task_complete"]);
    }

    #[tokio::test]
    async fn registered_tool_is_invoked() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let outcome = registry.execute("echo", json!({"text": "hi"})).await.unwrap();
        assert_eq!(outcome, ToolOutcome::Output("hi".into()));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_tool_error() {
        let registry = ToolRegistry::new();
        let err = registry.execute("rm_rf", json!({})).await.unwrap_err();
        match err {
            ShipwrightError::Tool { tool, message } => {
                assert_eq!(tool, "rm_rf");
                assert_eq!(message, "Unknown tool: rm_rf");
            }
            other => panic!("expected tool error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn task_complete_reports_summary_and_url() {
        let outcome = TaskCompleteTool
            .invoke(json!({
                "summary": "Fixed the bug",
                "pull_request_url": "https://github.com/acme/widgets/pull/7"
            }))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ToolOutcome::Complete {
                summary: "Fixed the bug".into(),
                pull_request_url: Some("https://github.com/acme/widgets/pull/7".into()),
            }
        );
    }

    #[tokio::test]
    async fn task_complete_requires_summary() {
        let err = TaskCompleteTool.invoke(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("invalid input"));
    }
}
