// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the MiniMedi intake engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level MiniMedi configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MinimediConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Remote service settings (model endpoint and record backend).
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence keys and canned turns.
    #[serde(default)]
    pub session: SessionConfig,

    /// Record reconciliation policy.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Local durable storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Remote service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL that `/ai-check/` and `/symptoms/` are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token attached to every request. `None` sends no Authorization header.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for the model call on transient statuses (429, 5xx overload).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between model call retries, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Storage key holding the JSON transcript.
    #[serde(default = "default_transcript_key")]
    pub transcript_key: String,

    /// Storage key holding the cached record identifier.
    #[serde(default = "default_record_key")]
    pub record_key: String,

    /// Assistant turn that seeds a fresh transcript.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Assistant turn appended when the model service call fails.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transcript_key: default_transcript_key(),
            record_key: default_record_key(),
            greeting: default_greeting(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

fn default_transcript_key() -> String {
    "minimedi_chat_session".to_string()
}

fn default_record_key() -> String {
    "minimedi_saved_record_id".to_string()
}

fn default_greeting() -> String {
    "Hello! I'm MiniMedi, your AI Health Assistant. 👋 Before we begin, may I know your name?"
        .to_string()
}

fn default_fallback_reply() -> String {
    "I'm having trouble thinking clearly right now. Please try again in a moment.".to_string()
}

/// When extracted data is written to the record backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePolicy {
    /// Every payload-bearing assistant turn creates or updates the record.
    #[default]
    EveryTurn,
    /// Only payloads flagged `complete: true` are written.
    OnCompletion,
}

/// What to do when an update targets a record deleted out-of-band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleRecordPolicy {
    /// Drop the stale identifier and create a fresh record in the same write.
    #[default]
    Recreate,
    /// Log the failure and keep the identifier.
    Report,
}

/// Record reconciliation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub save_policy: SavePolicy,

    #[serde(default)]
    pub stale_record: StaleRecordPolicy,

    /// Lower bound (inclusive) of the placeholder risk score.
    #[serde(default = "default_risk_score_min")]
    pub risk_score_min: u8,

    /// Upper bound (inclusive) of the placeholder risk score.
    #[serde(default = "default_risk_score_max")]
    pub risk_score_max: u8,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            save_policy: SavePolicy::default(),
            stale_record: StaleRecordPolicy::default(),
            risk_score_min: default_risk_score_min(),
            risk_score_max: default_risk_score_max(),
        }
    }
}

fn default_risk_score_min() -> u8 {
    20
}

fn default_risk_score_max() -> u8 {
    59
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database holding session state.
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
        .map(|p| p.join("minimedi").join("session.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("minimedi-session.db"))
        .to_string_lossy()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_sections_take_defaults() {
        let toml_str = r#"
[api]
base_url = "https://minimedi.example/api"
"#;
        let config: MinimediConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://minimedi.example/api");
        assert_eq!(config.api.max_retries, 1);
        assert_eq!(config.reconcile.save_policy, SavePolicy::EveryTurn);
        assert_eq!(config.reconcile.risk_score_min, 20);
        assert_eq!(config.reconcile.risk_score_max, 59);
        assert!(config.storage.wal_mode);
    }

    #[test]
    fn policies_deserialize_from_snake_case() {
        let toml_str = r#"
[reconcile]
save_policy = "on_completion"
stale_record = "report"
"#;
        let config: MinimediConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.reconcile.save_policy, SavePolicy::OnCompletion);
        assert_eq!(config.reconcile.stale_record, StaleRecordPolicy::Report);
    }

    #[test]
    fn reconcile_denies_unknown_fields() {
        let toml_str = r#"
[reconcile]
save_every = true
"#;
        assert!(toml::from_str::<MinimediConfig>(toml_str).is_err());
    }

    #[test]
    fn unknown_policy_value_is_rejected() {
        let toml_str = r#"
[reconcile]
stale_record = "ignore"
"#;
        assert!(toml::from_str::<MinimediConfig>(toml_str).is_err());
    }
}
