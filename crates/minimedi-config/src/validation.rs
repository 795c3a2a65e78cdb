// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express:
//! usable URLs, distinct storage keys, and sane numeric ranges.

use crate::diagnostic::ConfigError;
use crate::model::MinimediConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MinimediConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let base_url = config.api.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "api.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.api.timeout_secs == 0 {
        fail("api.timeout_secs must be greater than 0".to_string());
    }

    if let Some(token) = &config.api.auth_token {
        if token.trim().is_empty() {
            fail("api.auth_token must not be empty when set".to_string());
        }
    }

    let session = &config.session;
    if session.transcript_key.trim().is_empty() {
        fail("session.transcript_key must not be empty".to_string());
    }
    if session.record_key.trim().is_empty() {
        fail("session.record_key must not be empty".to_string());
    }
    if session.transcript_key == session.record_key {
        fail(format!(
            "session.transcript_key and session.record_key must differ, both are `{}`",
            session.record_key
        ));
    }
    if session.greeting.trim().is_empty() {
        fail("session.greeting must not be empty".to_string());
    }
    if session.fallback_reply.trim().is_empty() {
        fail("session.fallback_reply must not be empty".to_string());
    }

    let reconcile = &config.reconcile;
    if reconcile.risk_score_min > reconcile.risk_score_max {
        fail(format!(
            "reconcile.risk_score_min ({}) must not exceed reconcile.risk_score_max ({})",
            reconcile.risk_score_min, reconcile.risk_score_max
        ));
    }
    if reconcile.risk_score_max > 100 {
        fail(format!(
            "reconcile.risk_score_max must be at most 100, got {}",
            reconcile.risk_score_max
        ));
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
