// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the semantic constraints serde cannot express: bind address
//! shape, non-empty paths, URL schemes, and the caller token table.

use crate::diagnostic::ConfigError;
use crate::model::BiolineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &BiolineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.app.log_level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "app.log_level `{}` must be one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_ip && !is_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.server.body_limit_bytes == 0 {
        fail("server.body_limit_bytes must be greater than 0".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let base = config.whatsapp.api_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        fail(format!(
            "whatsapp.api_base_url `{base}` must start with http:// or https://"
        ));
    }

    if config.whatsapp.api_version.trim().is_empty() {
        fail("whatsapp.api_version must not be empty".to_string());
    }

    if config.whatsapp.request_timeout_secs < 1 {
        fail("whatsapp.request_timeout_secs must be at least 1".to_string());
    }

    if matches!(&config.whatsapp.verify_token, Some(t) if t.trim().is_empty()) {
        fail("whatsapp.verify_token must not be blank when set".to_string());
    }
    if matches!(&config.whatsapp.app_secret, Some(s) if s.is_empty()) {
        fail("whatsapp.app_secret must not be blank when set".to_string());
    }

    for (token, user) in &config.auth.tokens {
        if token.trim().is_empty() {
            fail("auth.tokens contains an empty token".to_string());
        }
        if user.trim().is_empty() {
            // Never echo the token itself.
            fail("auth.tokens maps a token to an empty user id".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
