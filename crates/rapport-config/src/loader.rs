// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/rapport/rapport.toml` (system-wide)
//! 3. `~/.config/rapport/rapport.toml` (user XDG config)
//! 4. `./rapport.toml` (local directory)
//! 5. `RAPPORT_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RapportConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/rapport/rapport.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG: &str = "rapport.toml";

/// Top-level sections that `RAPPORT_<SECTION>_<KEY>` variables map into.
const ENV_SECTIONS: &[&str] = &["server", "analysis", "anthropic", "auth", "storage"];

/// `~/.config/rapport/rapport.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rapport").join(LOCAL_CONFIG))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
pub fn load_config() -> Result<RapportConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<RapportConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RapportConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RapportConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RapportConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard hierarchy, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RapportConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with an explicit section mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `RAPPORT_AUTH_TOKEN_SECRET` maps to `auth.token_secret`.
fn env_provider() -> Env {
    Env::prefixed("RAPPORT_").map(|key| map_env_key(key.as_str()).into())
}

/// Figment passes keys in their original case; sections match lowercased.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
