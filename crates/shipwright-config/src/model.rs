// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Shipwright configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShipwrightConfig {
    /// Agent loop behavior.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Backoff policy for transient LLM failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Checkpoint persistence settings.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// SQLite storage settings (used by the `sqlite` checkpoint backend).
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Agent loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Turn budget for a run.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Inline system prompt. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Model used when a run does not select one.
    #[serde(default)]
    pub default_model: Option<String>,
}

impl AgentConfig {
    /// The effective system prompt: file contents when `system_prompt_file`
    /// is set, otherwise the inline prompt.
    pub fn resolve_system_prompt(&self) -> std::io::Result<Option<String>> {
        match &self.system_prompt_file {
            Some(path) => std::fs::read_to_string(path).map(Some),
            None => Ok(self.system_prompt.clone()),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            max_turns: default_max_turns(),
            system_prompt: None,
            system_prompt_file: None,
            default_model: None,
        }
    }
}

fn default_agent_name() -> String {
    "shipwright".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_turns() -> u32 {
    50
}

/// Exponential backoff settings for retryable LLM failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per turn, counting the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt; doubles after each further failure.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Status codes whose presence in a provider error marks it retryable.
    #[serde(default = "default_retryable_status_markers")]
    pub retryable_status_markers: Vec<u16>,
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            retryable_status_markers: default_retryable_status_markers(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_retryable_status_markers() -> Vec<u16> {
    vec![429, 500, 502, 503, 504, 529]
}

/// Which key-value backend stores checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackendKind {
    /// Durable SQLite file at `storage.database_path`.
    #[default]
    Sqlite,
    /// In-process map; nothing survives a restart.
    Memory,
}

/// Checkpoint persistence settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointConfig {
    /// Which key-value backend holds checkpoints.
    #[serde(default)]
    pub backend: CheckpointBackendKind,

    /// Namespace prepended to run IDs to form storage keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Retention window, refreshed on every write.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CheckpointConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: CheckpointBackendKind::default(),
            key_prefix: default_key_prefix(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_key_prefix() -> String {
    "checkpoint:".to_string()
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("shipwright").join("shipwright.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "shipwright.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ShipwrightConfig::default();
        assert_eq!(config.agent.max_turns, 50);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay(), Duration::from_secs(1));
        assert_eq!(config.retry.retryable_status_markers, vec![429, 500, 502, 503, 504, 529]);
        assert_eq!(config.checkpoint.backend, CheckpointBackendKind::Sqlite);
        assert_eq!(config.checkpoint.key_prefix, "checkpoint:");
        assert_eq!(config.checkpoint.ttl(), Duration::from_secs(604_800));
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn backend_kind_parses_lowercase() {
        let config: ShipwrightConfig = toml::from_str("[checkpoint]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.checkpoint.backend, CheckpointBackendKind::Memory);
    }

    #[test]
    fn unknown_retry_key_is_rejected() {
        let result = toml::from_str::<ShipwrightConfig>("[retry]\nmax_attempt = 3\n");
        assert!(result.is_err());
    }
}
