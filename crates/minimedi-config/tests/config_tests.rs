// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the MiniMedi configuration system.

use minimedi_config::diagnostic::ConfigError;
use minimedi_config::{
    load_and_validate_str, load_config_from_str, MinimediConfig, SavePolicy, StaleRecordPolicy,
};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[log]
level = "debug"

[api]
base_url = "https://clinic.example/api"
auth_token = "tok-123"
timeout_secs = 15
max_retries = 2
retry_backoff_ms = 50

[session]
transcript_key = "chat"
record_key = "record"
greeting = "Hi, what is your name?"
fallback_reply = "Sorry, try again."

[reconcile]
save_policy = "on_completion"
stale_record = "report"
risk_score_min = 10
risk_score_max = 90

[storage]
database_path = "/tmp/minimedi-test.db"
wal_mode = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.api.base_url, "https://clinic.example/api");
    assert_eq!(config.api.auth_token.as_deref(), Some("tok-123"));
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.api.max_retries, 2);
    assert_eq!(config.api.retry_backoff_ms, 50);
    assert_eq!(config.session.transcript_key, "chat");
    assert_eq!(config.session.record_key, "record");
    assert_eq!(config.session.greeting, "Hi, what is your name?");
    assert_eq!(config.reconcile.save_policy, SavePolicy::OnCompletion);
    assert_eq!(config.reconcile.stale_record, StaleRecordPolicy::Report);
    assert_eq!(config.reconcile.risk_score_min, 10);
    assert_eq!(config.reconcile.risk_score_max, 90);
    assert_eq!(config.storage.database_path, "/tmp/minimedi-test.db");
    assert!(!config.storage.wal_mode);
}

/// Defaults match the values the engine relies on when no file exists.
#[test]
fn defaults_are_stable() {
    let config = MinimediConfig::default();
    assert_eq!(config.api.base_url, "http://localhost:8000/api");
    assert_eq!(config.reconcile.save_policy, SavePolicy::EveryTurn);
    assert_eq!(config.reconcile.stale_record, StaleRecordPolicy::Recreate);
    assert_eq!(config.reconcile.risk_score_min, 20);
    assert_eq!(config.reconcile.risk_score_max, 59);
    assert!(config.session.greeting.contains("MiniMedi"));
}

/// Unknown field in [api] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_in_api_suggests_correction() {
    let toml = r#"
[api]
base_ulr = "http://localhost"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("expected an UnknownKey error");
    assert_eq!(unknown.0, "base_ulr");
    assert_eq!(unknown.1.as_deref(), Some("base_url"));
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telemetry]
enabled = true
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// An unrecognised policy name is reported rather than silently defaulted.
#[test]
fn unknown_policy_is_rejected() {
    let toml = r#"
[reconcile]
save_policy = "sometimes"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown policy");
    assert!(!errors.is_empty());
}

/// Wrong value type surfaces an error.
#[test]
fn wrong_type_is_rejected() {
    let toml = r#"
[api]
timeout_secs = "soon"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))));
}

/// Semantic validation runs after successful deserialization.
#[test]
fn validation_runs_after_parse() {
    let toml = r#"
[session]
transcript_key = "same"
record_key = "same"
"#;
    let errors = load_and_validate_str(toml).expect_err("duplicate keys should fail");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("must differ"))));
}
