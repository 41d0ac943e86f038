// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Shipwright agent turn loop.
//!
//! [`AgentRunner`] drives a [`RunState`](shipwright_core::RunState) to a
//! [`TaskResult`](shipwright_core::TaskResult): it calls the LLM gateway
//! with the accumulated conversation, executes requested tools in order,
//! backs off on transient provider failures, and checkpoints after every
//! assistant response and every tool phase. [`ResumeController`] decides
//! whether an interrupted run can be picked up again and hands back the
//! state to seed the new run with.

pub mod resume;
pub mod retry;
pub mod runner;
pub mod tools;

pub use resume::{ResumeController, ResumeError, ResumePlan};
pub use retry::RetryPolicy;
pub use runner::{
    AgentRunner, LLM_ERROR, MAX_TURNS_EXCEEDED, ProgressCallback, UNEXPECTED_STOP_REASON,
    run_agent,
};
pub use tools::{TASK_COMPLETE_TOOL, TaskCompleteTool, Tool, ToolRegistry};
