// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Shipwright.
//!
//! Provides a WAL-mode SQLite database with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and an expiring
//! key-value table that backs checkpoint storage.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteKv;
pub use database::Database;
