// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff for transient LLM gateway failures.

use std::time::Duration;

use shipwright_config::model::RetryConfig;
use shipwright_core::ShipwrightError;

/// Default total attempts per turn, first call included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay after the first failed attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// HTTP-style statuses that mark a provider failure as transient.
pub const DEFAULT_RETRYABLE_MARKERS: [u16; 6] = [429, 500, 502, 503, 504, 529];

/// How many times to call the LLM for one turn and how long to wait between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    retryable_markers: Vec<u16>,
}

impl RetryPolicy {
    /// A policy with custom bounds. `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, initial_delay: Duration, retryable_markers: Vec<u16>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            retryable_markers,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.initial_delay(),
            config.retryable_status_markers.clone(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to sleep after failed attempt `attempt` (1-based):
    /// `initial_delay * 2^(attempt - 1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }

    /// Whether `error` is worth another attempt.
    ///
    /// A provider error is retryable when its status code is one of the
    /// markers or its message mentions one. Every other error is matched on
    /// its display text, so a collaborator timeout surfacing as "504" is
    /// retried while one without a status is not.
    pub fn is_retryable(&self, error: &ShipwrightError) -> bool {
        if let ShipwrightError::Provider {
            status: Some(status),
            ..
        } = error
            && self.retryable_markers.contains(status)
        {
            return true;
        }

        let message = error.to_string();
        self.retryable_markers
            .iter()
            .any(|marker| message.contains(&marker.to_string()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_INITIAL_DELAY,
            DEFAULT_RETRYABLE_MARKERS.to_vec(),
        )
    }
}
