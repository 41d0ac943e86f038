// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Shipwright integration tests.
//!
//! # Components
//!
//! - [`ScriptedLlm`] - LLM gateway that replays a scripted sequence of
//!   responses and failures and records every request
//! - [`RecordingTools`] - tool gateway with per-tool canned behavior
//! - [`StaticStatusLookup`] - run-status lookup backed by a fixed map
//! - [`FailingKv`] - key-value backend whose every operation fails
//! - [`TestHarness`] - a runner wired to the mocks and a checkpoint store

pub mod failing_kv;
pub mod harness;
pub mod mock_llm;
pub mod mock_status;
pub mod mock_tools;

pub use failing_kv::FailingKv;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_llm::ScriptedLlm;
pub use mock_status::StaticStatusLookup;
pub use mock_tools::RecordingTools;
