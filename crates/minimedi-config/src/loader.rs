// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./minimedi.toml` > `~/.config/minimedi/minimedi.toml` >
//! `/etc/minimedi/minimedi.toml` with environment variable overrides via `MINIMEDI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MinimediConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/minimedi/minimedi.toml` (system-wide)
/// 3. `~/.config/minimedi/minimedi.toml` (user XDG config)
/// 4. `./minimedi.toml` (local directory)
/// 5. `MINIMEDI_*` environment variables
pub fn load_config() -> Result<MinimediConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MinimediConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MinimediConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MinimediConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MinimediConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MinimediConfig::default()))
        .merge(Toml::file("/etc/minimedi/minimedi.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("minimedi/minimedi.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("minimedi.toml"))
        .merge(env_provider())
}

/// Environment variable provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `MINIMEDI_API_AUTH_TOKEN`
/// must map to `api.auth_token`, not `api.auth.token`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("MINIMEDI_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("log_", "log.", 1)
            .replacen("api_", "api.", 1)
            .replacen("session_", "session.", 1)
            .replacen("reconcile_", "reconcile.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
