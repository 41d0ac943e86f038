// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted checkpoint record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shipwright_core::{Message, RunState, StopReason, WorkspaceConfig, is_final_answer};

/// Version of the record layout written by this build. Records carrying any
/// other version are ignored on load.
pub const SCHEMA_VERSION: u32 = 1;

/// A run-state snapshot as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub run_id: String,
    pub workspace_id: String,
    pub task_description: String,
    pub messages: Vec<Message>,
    pub turns_completed: u32,
    pub max_turns: u32,
    #[serde(default)]
    pub selected_model: Option<String>,
    pub workspace_config: WorkspaceConfig,
    /// Stop reason of the last LLM response, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_stop_reason: Option<StopReason>,
    /// When this snapshot was written.
    pub last_updated: DateTime<Utc>,
    /// Record layout version; see [`SCHEMA_VERSION`].
    pub schema_version: u32,
}

impl Checkpoint {
    /// Snapshot `state` at `now` with the current schema version.
    pub fn capture(state: &RunState, now: DateTime<Utc>) -> Self {
        Self {
            run_id: state.run_id.clone(),
            workspace_id: state.workspace_id.clone(),
            task_description: state.task_description.clone(),
            messages: state.messages.clone(),
            turns_completed: state.turns_completed,
            max_turns: state.max_turns,
            selected_model: state.selected_model.clone(),
            workspace_config: state.workspace_config.clone(),
            last_stop_reason: state.last_stop_reason,
            last_updated: now,
            schema_version: SCHEMA_VERSION,
        }
    }

    /// The run state this checkpoint was captured from.
    pub fn into_state(self) -> RunState {
        RunState {
            run_id: self.run_id,
            workspace_id: self.workspace_id,
            task_description: self.task_description,
            messages: self.messages,
            turns_completed: self.turns_completed,
            max_turns: self.max_turns,
            selected_model: self.selected_model,
            workspace_config: self.workspace_config,
            last_stop_reason: self.last_stop_reason,
        }
    }

    /// A checkpoint is resumable while turns remain and the conversation
    /// does not already end with a finished answer.
    pub fn metadata(&self) -> CheckpointMetadata {
        let answered = is_final_answer(&self.messages, self.last_stop_reason);
        CheckpointMetadata {
            turns_completed: self.turns_completed,
            last_updated: self.last_updated,
            can_resume: !self.messages.is_empty()
                && self.turns_completed < self.max_turns
                && !answered,
        }
    }
}

/// Lightweight summary of a checkpoint for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointMetadata {
    pub turns_completed: u32,
    pub last_updated: DateTime<Utc>,
    /// Turns remain and the run has not already produced its final answer.
    pub can_resume: bool,
}
