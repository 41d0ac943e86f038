// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable snapshots of agent runs.
//!
//! [`CheckpointStore`] serializes a [`RunState`](shipwright_core::RunState)
//! into a versioned JSON record and writes it to any
//! [`KvBackend`](shipwright_core::KvBackend) under `{prefix}{run_id}` with a
//! retention window refreshed on every write. Persistence is advisory:
//! saves and deletes never surface errors to the agent loop, and unreadable
//! or outdated records load as absent.
//!
//! [`MemoryKv`] is an in-process backend for tests and ephemeral runs.

pub mod memory;
pub mod record;
pub mod store;

pub use memory::MemoryKv;
pub use record::{Checkpoint, CheckpointMetadata, SCHEMA_VERSION};
pub use store::CheckpointStore;
