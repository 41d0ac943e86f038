// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resume controller gating and end-to-end resumption.

use std::sync::Arc;

use serde_json::json;
use shipwright_agent::{MAX_TURNS_EXCEEDED, ResumeController, ResumeError, UNEXPECTED_STOP_REASON};
use shipwright_core::{Role, RunStatus, StopReason};
use shipwright_test_utils::{RecordingTools, ScriptedLlm, StaticStatusLookup, TestHarness};

async fn exhausted_run(run_id: &str) -> TestHarness {
    let harness = TestHarness::builder()
        .with_llm(
            ScriptedLlm::new()
                .then_respond(ScriptedLlm::tool_use(&[("tu_1", "noop", json!({}))]))
                .then_respond(ScriptedLlm::tool_use(&[("tu_2", "noop", json!({}))]))
                .then_respond(ScriptedLlm::end_turn("Finished on resume")),
        )
        .with_tools(RecordingTools::new().with_output("noop", "ok"))
        .build()
        .await
        .unwrap();

    let result = harness
        .run(TestHarness::state(run_id, "Two-step task", 2), 2)
        .await
        .unwrap();
    assert_eq!(result.error.as_deref(), Some(MAX_TURNS_EXCEEDED));
    harness
}

#[tokio::test]
async fn completed_run_cannot_be_resumed() {
    let harness = exhausted_run("run-d").await;
    let controller = ResumeController::new(
        harness.checkpoints.clone(),
        Arc::new(StaticStatusLookup::new().with_status("run-d", RunStatus::Completed)),
    );

    let err = controller.prepare_resume("run-d").await.unwrap_err();
    assert!(matches!(err, ResumeError::AlreadyCompleted { ref run_id } if run_id == "run-d"));
}

#[tokio::test]
async fn completed_run_without_checkpoint_reports_completed() {
    let harness = TestHarness::builder().build().await.unwrap();
    let controller = ResumeController::new(
        harness.checkpoints.clone(),
        Arc::new(StaticStatusLookup::new().with_status("run-gone", RunStatus::Completed)),
    );

    let err = controller.prepare_resume("run-gone").await.unwrap_err();
    assert!(matches!(err, ResumeError::AlreadyCompleted { .. }));
}

#[tokio::test]
async fn queued_or_active_runs_are_already_running() {
    let harness = exhausted_run("run-busy").await;
    for status in [RunStatus::Queued, RunStatus::Active] {
        let controller = ResumeController::new(
            harness.checkpoints.clone(),
            Arc::new(StaticStatusLookup::new().with_status("run-busy", status)),
        );
        let err = controller.prepare_resume("run-busy").await.unwrap_err();
        match err {
            ResumeError::AlreadyRunning { status: reported, .. } => assert_eq!(reported, status),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn missing_checkpoint_is_reported() {
    let harness = TestHarness::builder().build().await.unwrap();
    let controller =
        ResumeController::new(harness.checkpoints.clone(), Arc::new(StaticStatusLookup::new()));

    let err = controller.prepare_resume("run-none").await.unwrap_err();
    assert!(matches!(err, ResumeError::CheckpointNotFound { .. }));
}

#[tokio::test]
async fn status_lookup_failure_is_surfaced() {
    let harness = exhausted_run("run-lookup").await;
    let controller = ResumeController::new(
        harness.checkpoints.clone(),
        Arc::new(StaticStatusLookup::failing("job store offline")),
    );

    let err = controller.prepare_resume("run-lookup").await.unwrap_err();
    assert!(matches!(err, ResumeError::StatusLookup { .. }));
    assert!(err.to_string().contains("job store offline"));
}

#[tokio::test]
async fn failed_run_resumes_under_a_new_id() {
    let harness = exhausted_run("run-old").await;
    let controller = ResumeController::new(
        harness.checkpoints.clone(),
        Arc::new(StaticStatusLookup::new().with_status("run-old", RunStatus::Failed)),
    );

    let plan = controller.prepare_resume("run-old").await.unwrap();
    assert_eq!(plan.turns_completed, 2);
    assert_eq!(plan.message_count, 5);
    assert_eq!(plan.prior_state.run_id, "run-old");

    // Preparing does not consume the checkpoint.
    assert!(harness.checkpoints.exists("run-old").await);

    let state = plan.into_run_state("run-new", Some(5));
    assert_eq!(state.turns_completed, 2);
    let result = harness.run(state, 5).await.unwrap();

    assert!(result.success);
    assert_eq!(result.summary, "Finished on resume");
    assert_eq!(result.turns, 3);
    assert!(!harness.checkpoints.exists("run-new").await);
    // The original checkpoint is only removed by an explicit delete.
    assert!(harness.checkpoints.exists("run-old").await);
    harness.checkpoints.delete("run-old").await;
    assert!(!harness.checkpoints.exists("run-old").await);
}

#[tokio::test]
async fn truncated_run_resumes_with_a_fresh_llm_turn() {
    let harness = TestHarness::builder()
        .with_llm(
            ScriptedLlm::new()
                .then_respond(ScriptedLlm::stopped(StopReason::MaxTokens, "half an ans"))
                .then_respond(ScriptedLlm::end_turn("the whole answer")),
        )
        .build()
        .await
        .unwrap();

    let first = harness
        .run(TestHarness::state("run-x", "Explain the bug", 10), 10)
        .await
        .unwrap();
    assert_eq!(
        first.error.as_deref(),
        Some(format!("{UNEXPECTED_STOP_REASON}: max_tokens").as_str())
    );
    let meta = harness.checkpoints.metadata("run-x").await.unwrap();
    assert!(meta.can_resume);

    let controller = ResumeController::new(
        harness.checkpoints.clone(),
        Arc::new(StaticStatusLookup::new().with_status("run-x", RunStatus::Failed)),
    );
    let plan = controller.prepare_resume("run-x").await.unwrap();
    let resumed = harness
        .run(plan.into_run_state("run-y", None), 10)
        .await
        .unwrap();

    assert!(resumed.success);
    assert_eq!(resumed.summary, "the whole answer");
    assert_eq!(resumed.turns, 2);
    assert_eq!(harness.llm.calls().await, 2);

    // The continuation keeps user and assistant turns alternating.
    let requests = harness.llm.requests().await;
    let sent = &requests[1].messages;
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].role, Role::Assistant);
    assert_eq!(sent[2].role, Role::User);
    assert!(sent[2].text().contains("max_tokens"));
}
