// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `shipwright resume-check <run-id>`.
//!
//! The CLI has no view into the job system, so every run reports status
//! `unknown` and the verdict rests on the checkpoint alone.

use std::io::IsTerminal;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use shipwright_agent::{ResumeController, ResumeError};
use shipwright_checkpoint::CheckpointStore;
use shipwright_core::{RunStatus, RunStatusLookup, ShipwrightError};

/// Status lookup that never knows anything about a run.
pub struct CheckpointOnlyStatus;

#[async_trait]
impl RunStatusLookup for CheckpointOnlyStatus {
    async fn status(&self, _run_id: &str) -> Result<RunStatus, ShipwrightError> {
        Ok(RunStatus::Unknown)
    }
}

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct ResumeCheckReport {
    pub run_id: String,
    pub resumable: bool,
    pub turns_completed: Option<u32>,
    pub max_turns: Option<u32>,
    pub messages: Option<usize>,
    pub reason: Option<String>,
}

/// Evaluate whether `run_id` can be resumed.
pub async fn check(store: CheckpointStore, run_id: &str) -> ResumeCheckReport {
    let controller = ResumeController::new(store, Arc::new(CheckpointOnlyStatus));
    match controller.prepare_resume(run_id).await {
        Ok(plan) => {
            let max_turns = plan.prior_state.max_turns;
            let answered = plan.prior_state.is_answered();
            let exhausted = plan.turns_completed >= max_turns;
            let resumable = !answered && !exhausted;
            let reason = if answered {
                Some("run already produced its final answer".to_string())
            } else if exhausted {
                Some("turn budget already exhausted".to_string())
            } else {
                None
            };
            ResumeCheckReport {
                run_id: run_id.to_string(),
                resumable,
                turns_completed: Some(plan.turns_completed),
                max_turns: Some(max_turns),
                messages: Some(plan.message_count),
                reason,
            }
        }
        Err(e) => ResumeCheckReport {
            run_id: run_id.to_string(),
            resumable: false,
            turns_completed: None,
            max_turns: None,
            messages: None,
            reason: Some(reason_for(&e)),
        },
    }
}

fn reason_for(err: &ResumeError) -> String {
    match err {
        ResumeError::CheckpointNotFound { .. } => "no checkpoint (expired or never written)".into(),
        other => other.to_string(),
    }
}

/// Run the `shipwright resume-check` command.
pub async fn run_resume_check(
    store: CheckpointStore,
    run_id: &str,
    json: bool,
    plain: bool,
) -> Result<(), ShipwrightError> {
    let report = check(store, run_id).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_report(&report, use_color));
    }
    Ok(())
}

fn render_report(report: &ResumeCheckReport, use_color: bool) -> String {
    let verdict = match (report.resumable, use_color) {
        (true, true) => {
            use colored::Colorize;
            format!("{} resumable", "✓".green())
        }
        (false, true) => {
            use colored::Colorize;
            format!("{} not resumable", "✗".red())
        }
        (true, false) => "[OK] resumable".to_string(),
        (false, false) => "[FAIL] not resumable".to_string(),
    };

    let mut out = format!("\n  resume-check {}\n  {}\n", report.run_id, "-".repeat(35));
    out.push_str("    Status:   unknown\n");
    if let (Some(turns), Some(max)) = (report.turns_completed, report.max_turns) {
        out.push_str(&format!("    Progress: {turns}/{max} turns\n"));
    }
    out.push_str(&format!("    Verdict:  {verdict}\n"));
    if let Some(reason) = &report.reason {
        out.push_str(&format!("    Reason:   {reason}\n"));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use shipwright_checkpoint::MemoryKv;
    use shipwright_core::{ContentBlock, Message, RunState, StopReason, WorkspaceConfig};

    fn store() -> CheckpointStore {
        CheckpointStore::new(Arc::new(MemoryKv::new()), "checkpoint:", Duration::from_secs(60))
    }

    fn state(turns: u32, max_turns: u32) -> RunState {
        let mut state = RunState::new(
            "run-9",
            "ws-9",
            "Upgrade the parser",
            WorkspaceConfig {
                owner: "acme".into(),
                repo: "widgets".into(),
                default_branch: "main".into(),
            },
            max_turns,
        );
        state.turns_completed = turns;
        state
    }

    #[tokio::test]
    async fn checkpoint_with_budget_left_is_resumable() {
        let store = store();
        store.save("run-9", &state(3, 10)).await;

        let report = check(store.clone(), "run-9").await;
        assert!(report.resumable);
        assert_eq!(report.turns_completed, Some(3));
        assert_eq!(report.messages, Some(1));
        assert!(report.reason.is_none());
        // Checking never consumes the checkpoint.
        assert!(store.exists("run-9").await);
    }

    #[tokio::test]
    async fn missing_checkpoint_is_not_resumable() {
        let report = check(store(), "ghost").await;
        assert!(!report.resumable);
        assert!(report.reason.unwrap().contains("no checkpoint"));
    }

    #[tokio::test]
    async fn exhausted_budget_is_not_resumable() {
        let store = store();
        store.save("run-9", &state(10, 10)).await;
        let report = check(store, "run-9").await;
        assert!(!report.resumable);
        assert_eq!(report.reason.as_deref(), Some("turn budget already exhausted"));
    }

    #[tokio::test]
    async fn finished_answer_is_not_resumable() {
        let store = store();
        let mut s = state(1, 10);
        s.messages
            .push(Message::assistant(vec![ContentBlock::text("done")], None));
        s.last_stop_reason = Some(StopReason::EndTurn);
        store.save("run-9", &s).await;

        let report = check(store, "run-9").await;
        assert!(!report.resumable);
        assert_eq!(report.reason.as_deref(), Some("run already produced its final answer"));
    }

    #[test]
    fn plain_report_lists_progress_and_reason() {
        let report = ResumeCheckReport {
            run_id: "run-9".into(),
            resumable: false,
            turns_completed: Some(10),
            max_turns: Some(10),
            messages: Some(21),
            reason: Some("turn budget already exhausted".into()),
        };
        let text = render_report(&report, false);
        assert!(text.contains("Progress: 10/10 turns"));
        assert!(text.contains("[FAIL] not resumable"));
        assert!(text.contains("Reason:   turn budget already exhausted"));
    }
}
