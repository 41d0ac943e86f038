// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading and diagnostics.

use shipwright_config::diagnostic::ConfigError;
use shipwright_config::model::CheckpointBackendKind;
use shipwright_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_config_deserializes() {
    let toml = r#"
[agent]
name = "builder"
log_level = "debug"
max_turns = 12
system_prompt = "You are a careful engineer."
default_model = "claude-sonnet-4-20250514"

[retry]
max_attempts = 3
initial_delay_ms = 250
retryable_status_markers = [429, 503]

[checkpoint]
backend = "memory"
key_prefix = "ckpt:"
ttl_secs = 3600

[storage]
database_path = "/tmp/shipwright-test.db"
wal_mode = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "builder");
    assert_eq!(config.agent.max_turns, 12);
    assert_eq!(config.agent.default_model.as_deref(), Some("claude-sonnet-4-20250514"));
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.initial_delay_ms, 250);
    assert_eq!(config.retry.retryable_status_markers, vec![429, 503]);
    assert_eq!(config.checkpoint.backend, CheckpointBackendKind::Memory);
    assert_eq!(config.checkpoint.key_prefix, "ckpt:");
    assert_eq!(config.checkpoint.ttl_secs, 3600);
    assert_eq!(config.storage.database_path, "/tmp/shipwright-test.db");
    assert!(!config.storage.wal_mode);
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.agent.name, "shipwright");
    assert_eq!(config.agent.log_level, "info");
    assert_eq!(config.agent.max_turns, 50);
    assert!(config.agent.system_prompt.is_none());
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.checkpoint.ttl_secs, 604_800);
    assert!(config.storage.database_path.ends_with("shipwright.db"));
}

#[test]
fn unknown_key_carries_suggestion_and_span() {
    let toml = "[agent]\nmax_turn = 4\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "max_turn");
            assert_eq!(suggestion.as_deref(), Some("max_turns"));
            assert!(span.is_some());
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[retry]\nmax_attempts = \"many\"\n")
        .expect_err("string is not an integer");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_errors_surface_after_parse() {
    let toml = "[agent]\nmax_turns = 0\n\n[checkpoint]\nttl_secs = 0\n";
    let errors = load_and_validate_str(toml).expect_err("zero values are invalid");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn file_config_loads_and_prompt_resolves_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let prompt_path = dir.path().join("prompt.md");
    std::fs::write(&prompt_path, "Ship small commits.").unwrap();

    let config_path = dir.path().join("shipwright.toml");
    std::fs::write(
        &config_path,
        format!(
            "[agent]\nsystem_prompt = \"inline\"\nsystem_prompt_file = \"{}\"\n",
            prompt_path.display()
        ),
    )
    .unwrap();

    let config = load_and_validate_path(&config_path).expect("file config should load");
    let prompt = config.agent.resolve_system_prompt().unwrap();
    assert_eq!(prompt.as_deref(), Some("Ship small commits."));
}

#[test]
fn inline_prompt_used_without_file() {
    let config = load_config_from_str("[agent]\nsystem_prompt = \"inline\"\n").unwrap();
    assert_eq!(
        config.agent.resolve_system_prompt().unwrap().as_deref(),
        Some("inline")
    );
}
