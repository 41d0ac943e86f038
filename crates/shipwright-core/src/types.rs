// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The run data model shared by the agent loop, the checkpoint store, and
//! the gateway adapters.
//!
//! All types serialize with camelCase field names; this is the shape other
//! tooling sees when it inspects a stored checkpoint.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ShipwrightError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    /// LLM gateway.
    Llm,
    /// Tool execution gateway.
    Tool,
    /// Key-value persistence backend.
    Storage,
    /// External run-status lookup.
    StatusLookup,
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Task descriptions and tool results.
    User,
    /// LLM output.
    Assistant,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ContentBlock {
    /// Free-form text.
    Text {
        /// The text itself.
        text: String,
    },
    /// A tool invocation requested by the assistant.
    ToolUse {
        /// Identifier the matching result must reference.
        id: String,
        /// Name of the tool to run.
        name: String,
        /// Tool arguments as emitted by the LLM.
        input: serde_json::Value,
    },
    /// The outcome of one tool invocation.
    ToolResult {
        /// `id` of the `ToolUse` block this answers.
        tool_use_id: String,
        /// Tool output, or the error text when `is_error` is set.
        content: String,
        /// Whether the tool failed.
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// A successful tool result.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// An error-flagged tool result. The content is prefixed with `Error: `.
    pub fn tool_error(tool_use_id: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: format!("Error: {}", message.as_ref()),
            is_error: true,
        }
    }
}

/// Message body: plain text or an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// A bare string, used for task descriptions.
    Text(String),
    /// Ordered content blocks.
    Blocks(Vec<ContentBlock>),
}

/// One exchange unit in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Who produced the message.
    pub role: Role,
    /// Message body.
    pub content: MessageContent,
    /// Reasoning trace from reasoning-capable models, stored verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl Message {
    /// A plain-text user message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
            reasoning_content: None,
        }
    }

    /// An assistant message built from the blocks an LLM returned.
    pub fn assistant(blocks: Vec<ContentBlock>, reasoning_content: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
            reasoning_content,
        }
    }

    /// A user message carrying one batch of tool results.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(results),
            reasoning_content: None,
        }
    }

    /// Content blocks of this message. Plain text yields an empty slice.
    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.content {
            MessageContent::Blocks(blocks) => blocks,
            MessageContent::Text(_) => &[],
        }
    }

    /// Concatenated text of the message, in block order.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Tool invocations requested by this message, in emission order.
    pub fn tool_uses(&self) -> Vec<ToolUseRequest> {
        self.blocks()
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => Some(ToolUseRequest {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// IDs referenced by the tool-result blocks of this message.
    pub fn tool_result_ids(&self) -> Vec<&str> {
        self.blocks()
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A single tool invocation pulled out of an assistant message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUseRequest {
    /// Block identifier, echoed back in the tool result.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    pub input: serde_json::Value,
}

/// Why the LLM stopped generating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// The model finished its answer.
    EndTurn,
    /// The model is waiting for tool results.
    ToolUse,
    /// Output was cut off at the token limit.
    MaxTokens,
    /// Output hit a configured stop sequence.
    StopSequence,
}

/// Tool catalog entry sent to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description shown to the LLM.
    pub description: String,
    /// JSON Schema of the tool's input.
    pub input_schema: serde_json::Value,
}

/// Everything the LLM gateway needs for one call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System prompt, possibly empty.
    pub system_prompt: String,
    /// Full conversation so far.
    pub messages: Vec<Message>,
    /// Tool catalog, sorted by name.
    pub tools: Vec<ToolDefinition>,
    /// Model override for this run; `None` lets the gateway pick its default.
    pub model: Option<String>,
}

/// A successful LLM response.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Assistant content blocks in emission order.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Reasoning trace, if the model produced one.
    pub reasoning_content: Option<String>,
}

/// What a tool execution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Regular textual output fed back to the LLM.
    Output(String),
    /// The task-complete tool finished the run.
    Complete {
        /// Final summary reported as the run's result.
        summary: String,
        /// Pull request opened by the run, if any.
        pull_request_url: Option<String>,
    },
}

/// Target repository of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Repository owner or organization.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch the work is based on.
    pub default_branch: String,
}

/// Conversation plus progress of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    /// Identifier of this run.
    pub run_id: String,
    /// Identifier of the isolated repository clone the run operates on.
    pub workspace_id: String,
    /// The task as originally submitted.
    pub task_description: String,
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
    /// LLM responses fully processed so far.
    pub turns_completed: u32,
    /// Turn budget.
    pub max_turns: u32,
    /// Model override passed to the LLM gateway.
    #[serde(default)]
    pub selected_model: Option<String>,
    /// Target repository.
    pub workspace_config: WorkspaceConfig,
    /// Stop reason of the most recent LLM response. `None` before the first
    /// response and for records written before this field existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_stop_reason: Option<StopReason>,
}

impl RunState {
    /// A fresh run whose conversation starts with the task description.
    pub fn new(
        run_id: impl Into<String>,
        workspace_id: impl Into<String>,
        task_description: impl Into<String>,
        workspace_config: WorkspaceConfig,
        max_turns: u32,
    ) -> Self {
        let task_description = task_description.into();
        Self {
            run_id: run_id.into(),
            workspace_id: workspace_id.into(),
            messages: vec![Message::user_text(task_description.clone())],
            task_description,
            turns_completed: 0,
            max_turns,
            selected_model: None,
            workspace_config,
            last_stop_reason: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.selected_model = Some(model.into());
        self
    }

    /// Checks the preconditions for running the loop on this state.
    pub fn validate(&self) -> Result<(), ShipwrightError> {
        if self.run_id.trim().is_empty() {
            return Err(ShipwrightError::InvalidRunState("run_id must not be empty".into()));
        }
        if self.max_turns == 0 {
            return Err(ShipwrightError::InvalidRunState("max_turns must be greater than 0".into()));
        }
        if self.messages.is_empty() {
            return Err(ShipwrightError::InvalidRunState(
                "messages must contain the task description".into(),
            ));
        }
        Ok(())
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True when the conversation ends with a complete assistant answer:
    /// the last response stopped with `end_turn` and requested no tools.
    pub fn is_answered(&self) -> bool {
        is_final_answer(&self.messages, self.last_stop_reason)
    }

    /// Tool calls of a trailing assistant message that never received results.
    ///
    /// Non-empty only when a run was interrupted between recording the
    /// assistant's tool requests and recording their results.
    pub fn pending_tool_uses(&self) -> Vec<ToolUseRequest> {
        match self.messages.last() {
            Some(last) if last.role == Role::Assistant => last.tool_uses(),
            _ => Vec::new(),
        }
    }
}

/// Whether `messages` ends with an assistant answer that stopped with
/// `end_turn` and carries no tool calls.
pub fn is_final_answer(messages: &[Message], last_stop_reason: Option<StopReason>) -> bool {
    last_stop_reason == Some(StopReason::EndTurn)
        && messages
            .last()
            .is_some_and(|m| m.role == Role::Assistant && m.tool_uses().is_empty())
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Whether the task completed.
    pub success: bool,
    /// Final answer or failure description.
    pub summary: String,
    /// Pull request opened by the run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_url: Option<String>,
    /// Machine-readable error code on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Turns consumed.
    pub turns: u32,
}

impl TaskResult {
    pub fn succeeded(summary: impl Into<String>, pull_request_url: Option<String>, turns: u32) -> Self {
        Self {
            success: true,
            summary: summary.into(),
            pull_request_url,
            error: None,
            turns,
        }
    }

    pub fn failed(summary: impl Into<String>, error: impl Into<String>, turns: u32) -> Self {
        Self {
            success: false,
            summary: summary.into(),
            pull_request_url: None,
            error: Some(error.into()),
            turns,
        }
    }
}

/// Run status as reported by the external job system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    /// Waiting for a worker.
    Queued,
    /// Currently executing.
    Active,
    /// Finished successfully.
    Completed,
    /// Finished with a failure.
    Failed,
    /// The job system has no record of the run.
    Unknown,
}
