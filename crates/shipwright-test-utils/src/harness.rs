// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring an `AgentRunner` to mock collaborators.
//!
//! Checkpoints go to an in-memory backend by default, or to a SQLite file
//! in a temp directory with [`TestHarnessBuilder::with_sqlite`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use shipwright_agent::{AgentRunner, ProgressCallback, RetryPolicy};
use shipwright_checkpoint::{CheckpointStore, MemoryKv};
use shipwright_config::model::StorageConfig;
use shipwright_core::{KvBackend, RunState, ShipwrightError, TaskResult, WorkspaceConfig};
use shipwright_storage::SqliteKv;

use crate::mock_llm::ScriptedLlm;
use crate::mock_tools::RecordingTools;

const TEST_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    llm: ScriptedLlm,
    tools: RecordingTools,
    kv: Option<Arc<dyn KvBackend>>,
    sqlite: bool,
    retry: RetryPolicy,
    system_prompt: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            llm: ScriptedLlm::new(),
            tools: RecordingTools::new(),
            kv: None,
            sqlite: false,
            retry: RetryPolicy::default(),
            system_prompt: "You are a test coding agent.".to_string(),
        }
    }

    pub fn with_llm(mut self, llm: ScriptedLlm) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_tools(mut self, tools: RecordingTools) -> Self {
        self.tools = tools;
        self
    }

    /// Store checkpoints in `kv` instead of a fresh in-memory backend.
    pub fn with_kv(mut self, kv: Arc<dyn KvBackend>) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Store checkpoints in a temporary SQLite database.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub async fn build(self) -> Result<TestHarness, ShipwrightError> {
        let mut temp_dir = None;
        let kv: Arc<dyn KvBackend> = match (self.kv, self.sqlite) {
            (Some(kv), _) => kv,
            (None, true) => {
                let dir = tempfile::TempDir::new().map_err(ShipwrightError::storage)?;
                let db_path = dir.path().join("checkpoints.db");
                let sqlite = SqliteKv::new(StorageConfig {
                    database_path: db_path.to_string_lossy().to_string(),
                    wal_mode: true,
                });
                sqlite.initialize().await?;
                temp_dir = Some(dir);
                Arc::new(sqlite)
            }
            (None, false) => Arc::new(MemoryKv::new()),
        };

        let checkpoints = CheckpointStore::new(kv.clone(), "checkpoint:", TEST_TTL);
        let llm = Arc::new(self.llm);
        let tools = Arc::new(self.tools);
        let progress = Arc::new(Mutex::new(Vec::new()));

        let sink = progress.clone();
        let on_progress: ProgressCallback = Arc::new(move |turn, max_turns| {
            if let Ok(mut events) = sink.lock() {
                events.push((turn, max_turns));
            }
        });

        let runner = AgentRunner::new(llm.clone(), tools.clone(), checkpoints.clone())
            .with_retry_policy(self.retry)
            .with_system_prompt(self.system_prompt)
            .with_progress(on_progress);

        Ok(TestHarness {
            llm,
            tools,
            kv,
            checkpoints,
            runner,
            progress,
            _temp_dir: temp_dir,
        })
    }
}

/// A runner plus handles on every collaborator for assertions.
pub struct TestHarness {
    pub llm: Arc<ScriptedLlm>,
    pub tools: Arc<RecordingTools>,
    pub kv: Arc<dyn KvBackend>,
    pub checkpoints: CheckpointStore,
    pub runner: AgentRunner,
    progress: Arc<Mutex<Vec<(u32, u32)>>>,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A fresh run state for `run_id` against a fixed test repository.
    pub fn state(run_id: &str, task: &str, max_turns: u32) -> RunState {
        RunState::new(
            run_id,
            format!("ws-{run_id}"),
            task,
            WorkspaceConfig {
                owner: "acme".to_string(),
                repo: "widgets".to_string(),
                default_branch: "main".to_string(),
            },
            max_turns,
        )
    }

    pub async fn run(&self, state: RunState, max_turns: u32) -> Result<TaskResult, ShipwrightError> {
        self.runner.run(state, max_turns).await
    }

    /// `(turns_completed, max_turns)` for each progress callback, in order.
    pub fn progress_events(&self) -> Vec<(u32, u32)> {
        self.progress
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}
