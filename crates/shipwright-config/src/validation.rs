// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ShipwrightConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &ShipwrightConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.agent.max_turns == 0 {
        fail("agent.max_turns must be greater than 0".to_string());
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.retry.max_attempts == 0 {
        fail("retry.max_attempts must be at least 1".to_string());
    }

    if config.retry.initial_delay_ms == 0 {
        fail("retry.initial_delay_ms must be greater than 0".to_string());
    }

    if config.retry.retryable_status_markers.is_empty() {
        fail("retry.retryable_status_markers must not be empty".to_string());
    }

    if config.checkpoint.ttl_secs == 0 {
        fail("checkpoint.ttl_secs must be greater than 0".to_string());
    }

    if config.checkpoint.key_prefix.trim().is_empty() {
        fail("checkpoint.key_prefix must not be empty".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
