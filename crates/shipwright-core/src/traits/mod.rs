// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the collaborators the agent loop depends on.
//!
//! Gateways and backends use `#[async_trait]` for dynamic dispatch, so the
//! loop and the resume controller can take them as `Arc<dyn ...>` and tests
//! can substitute in-memory fakes.

pub mod adapter;
pub mod kv;
pub mod llm;
pub mod status;
pub mod tool;

pub use adapter::PluginAdapter;
pub use kv::KvBackend;
pub use llm::LlmGateway;
pub use status::RunStatusLookup;
pub use tool::ToolGateway;
