// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Shipwright agent.

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ShipwrightError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors. `message` carries the HTTP-style status text
    /// the retry classifier inspects.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tool handler reported a failure.
    #[error("tool `{tool}` failed: {message}")]
    Tool { tool: String, message: String },

    /// JSON encoding or decoding failed.
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// A run was started with state that violates its preconditions.
    #[error("invalid run state: {0}")]
    InvalidRunState(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ShipwrightError {
    /// Builds a provider error from a bare message.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Builds a provider error that carries an HTTP status code.
    pub fn provider_status(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            message: format!("{status}: {}", message.into()),
            status: Some(status),
            source: None,
        }
    }

    /// Wraps any storage-layer error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }
}
