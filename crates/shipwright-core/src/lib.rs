// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Shipwright coding agent.
//!
//! This crate provides the error type, the run data model (messages, content
//! blocks, run state, task results), and the adapter traits the agent loop
//! talks to: the LLM gateway, the tool gateway, the key-value backend that
//! checkpoints live in, and the external run-status lookup.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ShipwrightError;
pub use types::{
    AdapterType, ChatRequest, ChatResponse, ContentBlock, HealthStatus, Message, MessageContent,
    Role, RunState, RunStatus, StopReason, TaskResult, ToolDefinition, ToolOutcome,
    ToolUseRequest, WorkspaceConfig, is_final_answer,
};

pub use traits::{KvBackend, LlmGateway, PluginAdapter, RunStatusLookup, ToolGateway};
