// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM gateway trait. Vendor adapters translate [`ChatRequest`] into their
//! own wire format.

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatRequest, ChatResponse};

/// Sends one conversation snapshot to a model and returns its reply.
///
/// Failures must be reported as [`ShipwrightError::Provider`] whose message
/// includes the HTTP status (e.g. `"429: rate limited"`), since the agent
/// loop classifies retryable failures from that text.
#[async_trait]
pub trait LlmGateway: PluginAdapter {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ShipwrightError>;
}
