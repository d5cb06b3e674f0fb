// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid IP addresses, non-empty paths, and minimum secret length.

use crate::diagnostic::ConfigError;
use crate::model::RapportConfig;

/// Minimum accepted length of `auth.token_secret`, in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 16;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &RapportConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.server.port == 0 {
        fail("server.port must not be 0".to_string());
    }

    for (i, origin) in config.server.cors_origins.iter().enumerate() {
        if origin.trim().is_empty() {
            fail(format!("server.cors_origins[{i}] must not be empty"));
        }
    }

    if config.anthropic.max_tokens == 0 {
        fail("anthropic.max_tokens must be greater than 0".to_string());
    }

    if config.anthropic.timeout_secs == 0 {
        fail("anthropic.timeout_secs must be greater than 0".to_string());
    }

    if let Some(path) = &config.storage.database_path
        && path.trim().is_empty()
    {
        fail("storage.database_path must not be empty when set".to_string());
    }

    if let Some(secret) = &config.auth.token_secret
        && secret.len() < MIN_TOKEN_SECRET_LEN
    {
        fail(format!(
            "auth.token_secret must be at least {MIN_TOKEN_SECRET_LEN} bytes, got {}",
            secret.len()
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::Validation { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&RapportConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = RapportConfig::default();
        config.storage.database_path = Some("  ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("database_path")));
    }

    #[test]
    fn short_token_secret_fails_validation() {
        let mut config = RapportConfig::default();
        config.auth.token_secret = Some("short".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("token_secret")));
    }

    #[test]
    fn collects_every_failure() {
        let mut config = RapportConfig::default();
        config.server.host = "not a host!".to_string();
        config.server.port = 0;
        config.anthropic.max_tokens = 0;
        config.anthropic.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = RapportConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.storage.database_path = Some("/tmp/rapport.db".to_string());
        config.auth.token_secret = Some("0123456789abcdef".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
