// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `shipwright checkpoint` subcommands.
//!
//! Read-mostly views over the checkpoint store. `--json` emits structured
//! output for scripting; otherwise a short table is printed, colored when
//! stdout is a terminal and `--plain` is not set.

use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use serde::Serialize;

use shipwright_checkpoint::{Checkpoint, CheckpointStore};
use shipwright_core::ShipwrightError;

/// Structured checkpoint view for `--json` mode.
#[derive(Debug, Serialize)]
pub struct CheckpointSummary {
    pub run_id: String,
    pub workspace_id: String,
    pub task: String,
    pub turns_completed: u32,
    pub max_turns: u32,
    pub messages: usize,
    pub model: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub can_resume: bool,
}

impl CheckpointSummary {
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        let meta = checkpoint.metadata();
        Self {
            run_id: checkpoint.run_id.clone(),
            workspace_id: checkpoint.workspace_id.clone(),
            task: checkpoint.task_description.clone(),
            turns_completed: checkpoint.turns_completed,
            max_turns: checkpoint.max_turns,
            messages: checkpoint.messages.len(),
            model: checkpoint.selected_model.clone(),
            last_updated: meta.last_updated,
            can_resume: meta.can_resume,
        }
    }
}

/// Human-readable age of a timestamp relative to `now`.
pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h ago")
    } else if hours > 0 {
        format!("{hours}h {minutes}m ago")
    } else if minutes > 0 {
        format!("{minutes}m ago")
    } else {
        "just now".to_string()
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Run `shipwright checkpoint list`.
pub async fn run_list(store: &CheckpointStore, json: bool) -> Result<(), ShipwrightError> {
    let run_ids = store.list_active().await?;
    if json {
        println!("{}", to_json(&run_ids));
        return Ok(());
    }
    if run_ids.is_empty() {
        println!("no active checkpoints");
        return Ok(());
    }
    for run_id in run_ids {
        println!("{run_id}");
    }
    Ok(())
}

/// Run `shipwright checkpoint show <run-id>`.
pub async fn run_show(
    store: &CheckpointStore,
    run_id: &str,
    json: bool,
    plain: bool,
) -> Result<(), ShipwrightError> {
    let Some(checkpoint) = store.load(run_id).await else {
        return Err(ShipwrightError::storage(format!(
            "no checkpoint found for run `{run_id}`"
        )));
    };
    let summary = CheckpointSummary::from_checkpoint(&checkpoint);

    if json {
        println!("{}", to_json(&summary));
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_summary(&summary, Utc::now(), use_color));
    }
    Ok(())
}

/// Run `shipwright checkpoint delete <run-id>`.
pub async fn run_delete(store: &CheckpointStore, run_id: &str) -> Result<(), ShipwrightError> {
    if !store.exists(run_id).await {
        println!("no checkpoint for run `{run_id}`");
        return Ok(());
    }
    store.delete(run_id).await;
    if store.exists(run_id).await {
        return Err(ShipwrightError::storage(format!(
            "checkpoint for run `{run_id}` could not be deleted"
        )));
    }
    println!("deleted checkpoint for run `{run_id}`");
    Ok(())
}

/// Run `shipwright checkpoint prune`.
pub async fn run_prune(store: &CheckpointStore) -> Result<(), ShipwrightError> {
    let removed = store.prune_expired().await?;
    println!("pruned {removed} expired checkpoint(s)");
    Ok(())
}

fn render_summary(summary: &CheckpointSummary, now: DateTime<Utc>, use_color: bool) -> String {
    let resumable = if use_color {
        use colored::Colorize;
        if summary.can_resume {
            format!("{} resumable", "✓".green())
        } else {
            format!("{} not resumable", "✗".red())
        }
    } else if summary.can_resume {
        "[OK] resumable".to_string()
    } else {
        "[--] not resumable".to_string()
    };

    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  checkpoint {}\n", summary.run_id));
    out.push_str(&format!("  {}\n", "-".repeat(35)));
    out.push_str(&format!("    Task:      {}\n", summary.task));
    out.push_str(&format!("    Workspace: {}\n", summary.workspace_id));
    out.push_str(&format!(
        "    Progress:  {}/{} turns, {} messages\n",
        summary.turns_completed, summary.max_turns, summary.messages
    ));
    out.push_str(&format!(
        "    Model:     {}\n",
        summary.model.as_deref().unwrap_or("(default)")
    ));
    out.push_str(&format!(
        "    Updated:   {} ({})\n",
        summary.last_updated.to_rfc3339(),
        format_age(summary.last_updated, now)
    ));
    out.push_str(&format!("    State:     {resumable}\n"));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use shipwright_checkpoint::MemoryKv;
    use shipwright_core::{RunState, WorkspaceConfig};

    fn store() -> CheckpointStore {
        CheckpointStore::new(
            Arc::new(MemoryKv::new()),
            "checkpoint:",
            Duration::from_secs(3600),
        )
    }

    fn state(run_id: &str, turns: u32, max_turns: u32) -> RunState {
        let mut state = RunState::new(
            run_id,
            "ws-1",
            "Fix the flaky login test",
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

    #[test]
    fn format_age_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(format_age(now - chrono::Duration::minutes(5), now), "5m ago");
        assert_eq!(
            format_age(now - chrono::Duration::minutes(125), now),
            "2h 5m ago"
        );
        assert_eq!(format_age(now - chrono::Duration::hours(26), now), "1d 2h ago");
        assert_eq!(format_age(now + chrono::Duration::minutes(1), now), "just now");
    }

    #[test]
    fn summary_reflects_checkpoint() {
        let checkpoint = Checkpoint::capture(&state("run-1", 3, 10).with_model("m-1"), Utc::now());
        let summary = CheckpointSummary::from_checkpoint(&checkpoint);
        assert_eq!(summary.run_id, "run-1");
        assert_eq!(summary.turns_completed, 3);
        assert_eq!(summary.messages, 1);
        assert_eq!(summary.model.as_deref(), Some("m-1"));
        assert!(summary.can_resume);

        let exhausted = Checkpoint::capture(&state("run-2", 10, 10), Utc::now());
        assert!(!CheckpointSummary::from_checkpoint(&exhausted).can_resume);
    }

    #[test]
    fn plain_render_has_no_escape_codes() {
        let now = Utc::now();
        let checkpoint = Checkpoint::capture(&state("run-1", 2, 10), now);
        let text = render_summary(&CheckpointSummary::from_checkpoint(&checkpoint), now, false);
        assert!(text.contains("checkpoint run-1"));
        assert!(text.contains("2/10 turns, 1 messages"));
        assert!(text.contains("(default)"));
        assert!(text.contains("[OK] resumable"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn summary_serializes_for_json_mode() {
        let checkpoint = Checkpoint::capture(&state("run-1", 2, 10), Utc::now());
        let json = serde_json::to_value(CheckpointSummary::from_checkpoint(&checkpoint)).unwrap();
        assert_eq!(json["run_id"], "run-1");
        assert_eq!(json["turns_completed"], 2);
        assert_eq!(json["can_resume"], true);
    }

    #[tokio::test]
    async fn show_missing_checkpoint_is_an_error() {
        let err = run_show(&store(), "ghost", true, true).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn delete_removes_checkpoint() {
        let store = store();
        store.save("run-1", &state("run-1", 1, 10)).await;
        assert!(store.exists("run-1").await);

        run_delete(&store, "run-1").await.unwrap();
        assert!(!store.exists("run-1").await);

        // Deleting again is not an error.
        run_delete(&store, "run-1").await.unwrap();
    }

    #[tokio::test]
    async fn list_and_prune_succeed_on_populated_store() {
        let store = store();
        store.save("a", &state("a", 1, 10)).await;
        store.save("b", &state("b", 1, 10)).await;
        run_list(&store, false).await.unwrap();
        run_list(&store, true).await.unwrap();
        run_prune(&store).await.unwrap();
        assert_eq!(store.list_active().await.unwrap(), vec!["a", "b"]);
    }
}
