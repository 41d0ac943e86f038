// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validation and preparation of run resumption.
//!
//! The controller only answers "can this run continue, and from what
//! state?". Enqueuing the new run is left to the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use shipwright_checkpoint::CheckpointStore;
use shipwright_core::{RunState, RunStatus, RunStatusLookup, ShipwrightError};

/// Why a run cannot be resumed.
#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("no checkpoint found for run `{run_id}`")]
    CheckpointNotFound { run_id: String },

    #[error("run `{run_id}` is still {status}")]
    AlreadyRunning { run_id: String, status: RunStatus },

    #[error("run `{run_id}` already completed successfully")]
    AlreadyCompleted { run_id: String },

    #[error("could not determine the status of run `{run_id}`: {source}")]
    StatusLookup {
        run_id: String,
        #[source]
        source: ShipwrightError,
    },
}

/// Everything needed to seed a new run from an interrupted one.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePlan {
    pub prior_state: RunState,
    pub turns_completed: u32,
    pub message_count: usize,
    pub last_updated: DateTime<Utc>,
}

impl ResumePlan {
    /// Initial state for the new run. Conversation, progress, model, and
    /// workspace carry over unchanged; `max_turns` defaults to the prior budget.
    pub fn into_run_state(self, new_run_id: impl Into<String>, max_turns: Option<u32>) -> RunState {
        let mut state = self.prior_state;
        state.run_id = new_run_id.into();
        if let Some(max_turns) = max_turns {
            state.max_turns = max_turns;
        }
        state
    }
}

/// Gatekeeper for resuming runs from their checkpoints.
pub struct ResumeController {
    checkpoints: CheckpointStore,
    status: Arc<dyn RunStatusLookup>,
}

impl ResumeController {
    pub fn new(checkpoints: CheckpointStore, status: Arc<dyn RunStatusLookup>) -> Self {
        Self {
            checkpoints,
            status,
        }
    }

    /// Checks that `run_id` is neither in flight nor finished and that its
    /// checkpoint is loadable. The checkpoint itself is left untouched.
    pub async fn prepare_resume(&self, run_id: &str) -> Result<ResumePlan, ResumeError> {
        let status = self
            .status
            .status(run_id)
            .await
            .map_err(|source| ResumeError::StatusLookup {
                run_id: run_id.to_string(),
                source,
            })?;
        debug!(run_id, %status, "run status for resume");

        match status {
            RunStatus::Queued | RunStatus::Active => {
                return Err(ResumeError::AlreadyRunning {
                    run_id: run_id.to_string(),
                    status,
                });
            }
            RunStatus::Completed => {
                return Err(ResumeError::AlreadyCompleted {
                    run_id: run_id.to_string(),
                });
            }
            RunStatus::Failed | RunStatus::Unknown => {}
        }

        let checkpoint =
            self.checkpoints
                .load(run_id)
                .await
                .ok_or_else(|| ResumeError::CheckpointNotFound {
                    run_id: run_id.to_string(),
                })?;

        let plan = ResumePlan {
            turns_completed: checkpoint.turns_completed,
            message_count: checkpoint.messages.len(),
            last_updated: checkpoint.last_updated,
            prior_state: checkpoint.into_state(),
        };
        info!(
            run_id,
            turns_completed = plan.turns_completed,
            messages = plan.message_count,
            "run is resumable"
        );
        Ok(plan)
    }
}
