// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted LLM gateway for deterministic testing.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use shipwright_core::{
    AdapterType, ChatRequest, ChatResponse, ContentBlock, HealthStatus, LlmGateway,
    PluginAdapter, ShipwrightError, StopReason,
};

/// One scripted gateway reply.
#[derive(Debug, Clone)]
enum Step {
    Respond(ChatResponse),
    Fail { message: String, status: Option<u16> },
}

impl Step {
    fn produce(self) -> Result<ChatResponse, ShipwrightError> {
        match self {
            Step::Respond(response) => Ok(response),
            Step::Fail { message, status } => Err(ShipwrightError::Provider {
                message,
                status,
                source: None,
            }),
        }
    }
}

#[derive(Default)]
struct Recorded {
    requests: Vec<ChatRequest>,
    call_times: Vec<Instant>,
}

/// An LLM gateway that pops replies from a FIFO script.
///
/// When the script runs dry the `otherwise` step repeats forever; without
/// one, an `end_turn` reply with the text "mock response" is returned.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Step>>,
    otherwise: Option<Step>,
    recorded: Mutex<Recorded>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            otherwise: None,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Queue a successful reply.
    pub fn then_respond(mut self, response: ChatResponse) -> Self {
        self.script.get_mut().push_back(Step::Respond(response));
        self
    }

    /// Queue a provider failure carrying `message`.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Step::Fail {
            message: message.into(),
            status: None,
        });
        self
    }

    /// Reply used for every call after the script is exhausted.
    pub fn otherwise_respond(mut self, response: ChatResponse) -> Self {
        self.otherwise = Some(Step::Respond(response));
        self
    }

    /// Failure used for every call after the script is exhausted.
    pub fn otherwise_fail(mut self, message: impl Into<String>) -> Self {
        self.otherwise = Some(Step::Fail {
            message: message.into(),
            status: None,
        });
        self
    }

    /// An `end_turn` reply with a single text block.
    pub fn end_turn(text: impl Into<String>) -> ChatResponse {
        ChatResponse {
            content: vec![ContentBlock::text(text)],
            stop_reason: StopReason::EndTurn,
            reasoning_content: None,
        }
    }

    /// A `tool_use` reply requesting the given `(id, name, input)` calls in order.
    pub fn tool_use(calls: &[(&str, &str, serde_json::Value)]) -> ChatResponse {
        ChatResponse {
            content: calls
                .iter()
                .map(|(id, name, input)| ContentBlock::tool_use(*id, *name, input.clone()))
                .collect(),
            stop_reason: StopReason::ToolUse,
            reasoning_content: None,
        }
    }

    /// A reply that stops for `stop_reason` with the given text.
    pub fn stopped(stop_reason: StopReason, text: impl Into<String>) -> ChatResponse {
        ChatResponse {
            content: vec![ContentBlock::text(text)],
            stop_reason,
            reasoning_content: None,
        }
    }

    /// Number of `chat` calls made so far.
    pub async fn calls(&self) -> usize {
        self.recorded.lock().await.requests.len()
    }

    /// Every request received, in call order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.recorded.lock().await.requests.clone()
    }

    /// Clock reading at each call, for asserting backoff spacing under a paused clock.
    pub async fn call_times(&self) -> Vec<Instant> {
        self.recorded.lock().await.call_times.clone()
    }
}

impl Default for ScriptedLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted-llm"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Llm
    }

    async fn health_check(&self) -> Result<HealthStatus, ShipwrightError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ShipwrightError> {
        Ok(())
    }
}

#[async_trait]
impl LlmGateway for ScriptedLlm {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ShipwrightError> {
        {
            let mut recorded = self.recorded.lock().await;
            recorded.requests.push(request);
            recorded.call_times.push(Instant::now());
        }

        let next = self.script.lock().await.pop_front();
        match next.or_else(|| self.otherwise.clone()) {
            Some(step) => step.produce(),
            None => Ok(Self::end_turn("mock response")),
        }
    }
}
