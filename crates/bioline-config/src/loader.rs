// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Precedence, lowest first: compiled defaults, the TOML files returned by
//! [`candidate_files`], then `BIOLINE_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BiolineConfig;

/// Section names recognised in `BIOLINE_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["app", "server", "storage", "whatsapp", "auth"];

/// Config files consulted by [`load_config`], lowest precedence first:
/// `/etc/bioline/bioline.toml`, the user's XDG config dir, then
/// `./bioline.toml`. Missing files are skipped by figment.
pub fn candidate_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/bioline/bioline.toml")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("bioline").join("bioline.toml"));
    }
    files.push(PathBuf::from("bioline.toml"));
    files
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(BiolineConfig::default()))
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    candidate_files()
        .into_iter()
        .fold(defaults(), |figment, file| figment.merge(Toml::file(file)))
        .merge(env_provider())
}

/// Load from the file hierarchy with env var overrides.
pub fn load_config() -> Result<BiolineConfig, figment::Error> {
    build_figment().extract()
}

/// Load from one explicit file plus env overrides; the hierarchy is ignored.
pub fn load_config_from_path(path: &Path) -> Result<BiolineConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BiolineConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `BIOLINE_WHATSAPP_APP_SECRET` must become
/// `whatsapp.app_secret`, not `whatsapp.app.secret`.
fn env_provider() -> Env {
    Env::prefixed("BIOLINE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
