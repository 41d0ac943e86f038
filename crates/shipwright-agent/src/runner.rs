// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agent turn loop.
//!
//! A turn is one successful LLM response fully processed: the assistant
//! message is appended, the turn counter advances, progress is reported,
//! and the state is checkpointed. If the response asks for tools they are
//! executed one at a time in emission order and their results are appended
//! as a single user message, followed by a second checkpoint. Failed LLM
//! attempts inside a turn never advance the counter.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use shipwright_checkpoint::CheckpointStore;
use shipwright_core::{
    ChatRequest, ChatResponse, ContentBlock, LlmGateway, Message, Role, RunState, ShipwrightError,
    StopReason, TaskResult, ToolDefinition, ToolGateway, ToolOutcome, ToolUseRequest,
};

use crate::retry::RetryPolicy;

/// `TaskResult.error` when the turn budget runs out.
pub const MAX_TURNS_EXCEEDED: &str = "MAX_TURNS_EXCEEDED";

/// `TaskResult.error` prefix for fatal provider failures.
pub const LLM_ERROR: &str = "LLM_ERROR";

/// `TaskResult.error` prefix when the LLM stops for a reason the loop cannot act on.
pub const UNEXPECTED_STOP_REASON: &str = "UNEXPECTED_STOP_REASON";

const DEFAULT_SUMMARY: &str = "Task completed.";

/// Invoked once per completed turn with `(turns_completed, max_turns)`.
pub type ProgressCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// What the tool phase of a turn produced.
enum ToolPhase {
    /// Results were appended; the loop moves on to the next turn.
    Continue,
    /// The task-complete tool ended the run.
    Complete {
        summary: String,
        pull_request_url: Option<String>,
    },
}

/// Where processing one LLM response left the run.
enum TurnOutcome {
    Continue,
    Finished(TaskResult),
}

/// An LLM call that could not be completed within the retry budget.
struct LlmFailure {
    attempts: u32,
    error: ShipwrightError,
}

/// Drives runs to completion against injected collaborators.
pub struct AgentRunner {
    llm: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolGateway>,
    checkpoints: CheckpointStore,
    retry: RetryPolicy,
    system_prompt: String,
    on_progress: Option<ProgressCallback>,
}

impl AgentRunner {
    pub fn new(
        llm: Arc<dyn LlmGateway>,
        tools: Arc<dyn ToolGateway>,
        checkpoints: CheckpointStore,
    ) -> Self {
        Self {
            llm,
            tools,
            checkpoints,
            retry: RetryPolicy::default(),
            system_prompt: String::new(),
            on_progress: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Runs `state` until it finishes, fails, or uses up `max_turns`.
    ///
    /// `max_turns` replaces `state.max_turns`. Returns `Err` only when the
    /// input state is unusable; every outcome after the first LLM call is
    /// reported through the returned [`TaskResult`].
    pub async fn run(
        &self,
        mut state: RunState,
        max_turns: u32,
    ) -> Result<TaskResult, ShipwrightError> {
        state.max_turns = max_turns;
        state.validate()?;
        if state.turns_completed > state.max_turns {
            return Err(ShipwrightError::InvalidRunState(format!(
                "turns_completed ({}) exceeds max_turns ({})",
                state.turns_completed, state.max_turns
            )));
        }

        let run_id = state.run_id.clone();
        info!(
            run_id = %run_id,
            max_turns,
            turns_completed = state.turns_completed,
            messages = state.messages.len(),
            "agent run starting"
        );

        if let Some(result) = self.recover_interrupted_turn(&mut state).await {
            return Ok(result);
        }

        let tools = self.tools.definitions();

        while state.turns_completed < state.max_turns {
            let turn = state.turns_completed + 1;
            let response = match self.call_llm(&state, &tools, turn).await {
                Ok(response) => response,
                Err(failure) => return Ok(self.llm_failed(&state, turn, failure)),
            };

            if let TurnOutcome::Finished(result) = self.process_response(&mut state, response).await
            {
                return Ok(result);
            }
        }

        warn!(
            run_id = %run_id,
            turns = state.turns_completed,
            "turn budget exhausted, checkpoint retained"
        );
        Ok(TaskResult::failed(
            format!(
                "The agent used all {} turns without completing the task.",
                state.max_turns
            ),
            MAX_TURNS_EXCEEDED,
            state.turns_completed,
        ))
    }

    /// Handles a state whose last message is from the assistant, which only
    /// happens when a previous process stopped mid-turn.
    ///
    /// Unanswered tool calls are executed before the first new LLM call,
    /// without consuming a turn. A trailing `end_turn` answer means the run
    /// had already finished. Any other trailing answer (truncated, stopped on
    /// a stop sequence, or of unknown origin) gets a user nudge so the next
    /// turn continues the task.
    async fn recover_interrupted_turn(&self, state: &mut RunState) -> Option<TaskResult> {
        let last = state.last_message()?;
        if last.role != Role::Assistant {
            return None;
        }

        let pending = state.pending_tool_uses();
        if pending.is_empty() {
            if state.is_answered() {
                let summary = summary_from(last);
                info!(run_id = %state.run_id, "run already answered, nothing to resume");
                self.checkpoints.delete(&state.run_id).await;
                return Some(TaskResult::succeeded(summary, None, state.turns_completed));
            }

            let reason = state
                .last_stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            info!(
                run_id = %state.run_id,
                stop_reason = %reason,
                "previous answer was incomplete, continuing with a new turn"
            );
            state
                .messages
                .push(Message::user_text(continuation_prompt(&reason)));
            return None;
        }

        info!(
            run_id = %state.run_id,
            pending = pending.len(),
            "executing tool calls left over from an interrupted turn"
        );
        self.finish_tool_phase(state, &pending).await
    }

    /// One LLM call for `turn`, retried with backoff on transient failures.
    async fn call_llm(
        &self,
        state: &RunState,
        tools: &[ToolDefinition],
        turn: u32,
    ) -> Result<ChatResponse, LlmFailure> {
        let request = ChatRequest {
            system_prompt: self.system_prompt.clone(),
            messages: state.messages.clone(),
            tools: tools.to_vec(),
            model: state.selected_model.clone(),
        };

        let mut attempt = 1;
        loop {
            debug!(run_id = %state.run_id, turn, attempt, "calling LLM");
            let error = match self.llm.chat(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        info!(run_id = %state.run_id, turn, attempt, "LLM call succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !self.retry.is_retryable(&error) || attempt >= self.retry.max_attempts() {
                return Err(LlmFailure {
                    attempts: attempt,
                    error,
                });
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                run_id = %state.run_id,
                turn,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retryable LLM failure, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Applies one successful LLM response to the run. Every response goes
    /// through here, whether it came from a first attempt or a retry.
    async fn process_response(&self, state: &mut RunState, response: ChatResponse) -> TurnOutcome {
        let stop_reason = response.stop_reason;
        state
            .messages
            .push(Message::assistant(response.content, response.reasoning_content));
        state.last_stop_reason = Some(stop_reason);
        state.turns_completed += 1;
        let turn = state.turns_completed;

        if let Some(on_progress) = &self.on_progress {
            on_progress(turn, state.max_turns);
        }
        self.checkpoints.save(&state.run_id, state).await;

        match stop_reason {
            StopReason::EndTurn => {
                let summary = state.last_message().map(summary_from).unwrap_or_default();
                info!(run_id = %state.run_id, turns = turn, "agent finished");
                self.checkpoints.delete(&state.run_id).await;
                TurnOutcome::Finished(TaskResult::succeeded(summary, None, turn))
            }
            StopReason::ToolUse => {
                let calls = state
                    .last_message()
                    .map(Message::tool_uses)
                    .unwrap_or_default();
                if calls.is_empty() {
                    error!(run_id = %state.run_id, turn, "tool_use stop without tool calls, ending run");
                    return TurnOutcome::Finished(TaskResult::failed(
                        format!("The LLM asked for tools on turn {turn} but named none."),
                        format!("{UNEXPECTED_STOP_REASON}: {stop_reason}"),
                        turn,
                    ));
                }
                match self.finish_tool_phase(state, &calls).await {
                    Some(result) => TurnOutcome::Finished(result),
                    None => TurnOutcome::Continue,
                }
            }
            other => {
                error!(
                    run_id = %state.run_id,
                    turn,
                    stop_reason = %other,
                    "unexpected stop reason, ending run"
                );
                TurnOutcome::Finished(TaskResult::failed(
                    format!("The LLM stopped unexpectedly ({other}) on turn {turn}."),
                    format!("{UNEXPECTED_STOP_REASON}: {other}"),
                    turn,
                ))
            }
        }
    }

    /// Executes `calls` and records the outcome: a finished run when the
    /// task-complete tool fired, otherwise a checkpoint of the appended results.
    async fn finish_tool_phase(
        &self,
        state: &mut RunState,
        calls: &[ToolUseRequest],
    ) -> Option<TaskResult> {
        match self.execute_tools(state, calls).await {
            ToolPhase::Complete {
                summary,
                pull_request_url,
            } => {
                info!(
                    run_id = %state.run_id,
                    turns = state.turns_completed,
                    pull_request_url = pull_request_url.as_deref().unwrap_or(""),
                    "task marked complete"
                );
                self.checkpoints.delete(&state.run_id).await;
                Some(TaskResult::succeeded(
                    summary,
                    pull_request_url,
                    state.turns_completed,
                ))
            }
            ToolPhase::Continue => {
                self.checkpoints.save(&state.run_id, state).await;
                None
            }
        }
    }

    /// Runs tool calls sequentially and appends their results as one user
    /// message. Stops at the first completion signal without appending.
    async fn execute_tools(&self, state: &mut RunState, calls: &[ToolUseRequest]) -> ToolPhase {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            debug!(run_id = %state.run_id, tool = %call.name, tool_use_id = %call.id, "executing tool");
            match self.tools.execute(&call.name, call.input.clone()).await {
                Ok(ToolOutcome::Output(output)) => {
                    results.push(ContentBlock::tool_result(&call.id, output));
                }
                Ok(ToolOutcome::Complete {
                    summary,
                    pull_request_url,
                }) => {
                    return ToolPhase::Complete {
                        summary,
                        pull_request_url,
                    };
                }
                Err(e) => {
                    warn!(run_id = %state.run_id, tool = %call.name, error = %e, "tool execution failed");
                    results.push(ContentBlock::tool_error(&call.id, tool_error_text(&e)));
                }
            }
        }

        state.messages.push(Message::tool_results(results));
        ToolPhase::Continue
    }

    fn llm_failed(&self, state: &RunState, turn: u32, failure: LlmFailure) -> TaskResult {
        let plural = if failure.attempts == 1 { "" } else { "s" };
        let detail = format!(
            "LLM call failed on turn {turn} after {} attempt{plural}: {}",
            failure.attempts, failure.error
        );
        error!(
            run_id = %state.run_id,
            turn,
            attempts = failure.attempts,
            error = %failure.error,
            "LLM call failed, checkpoint retained"
        );
        TaskResult::failed(
            format!("The agent stopped on turn {turn} because the LLM call failed."),
            format!("{LLM_ERROR}: {detail}"),
            state.turns_completed,
        )
    }
}

/// Runs one agent loop with default retry policy and no system prompt.
pub async fn run_agent(
    initial_state: RunState,
    max_turns: u32,
    llm: Arc<dyn LlmGateway>,
    tools: Arc<dyn ToolGateway>,
    checkpoints: CheckpointStore,
    on_progress: Option<ProgressCallback>,
) -> Result<TaskResult, ShipwrightError> {
    let mut runner = AgentRunner::new(llm, tools, checkpoints);
    if let Some(on_progress) = on_progress {
        runner = runner.with_progress(on_progress);
    }
    runner.run(initial_state, max_turns).await
}

fn summary_from(message: &Message) -> String {
    let text = message.text();
    if text.trim().is_empty() {
        DEFAULT_SUMMARY.to_string()
    } else {
        text
    }
}

fn continuation_prompt(stop_reason: &str) -> String {
    format!(
        "Your previous response ended before the task was finished \
         (stop reason: {stop_reason}). Continue working on the task."
    )
}

/// The text a failed tool call reports back to the model.
fn tool_error_text(error: &ShipwrightError) -> String {
    match error {
        ShipwrightError::Tool { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
