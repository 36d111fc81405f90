// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order for the config file: an explicit `--config` path, else the
//! first existing of `./config.json`, `./mailtriage.toml`,
//! `~/.config/mailtriage/config.json`. `MAILTRIAGE_*` environment variables
//! override file values.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};

use crate::model::TriageConfig;

/// Config file sections addressable from the environment.
const SECTIONS: &[&str] = &[
    "agent", "settings", "labels", "prompts", "gmail", "openai", "gateway",
];

/// On-disk configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Candidate config file locations, highest priority first.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("config.json"), PathBuf::from("mailtriage.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("mailtriage/config.json"));
    }
    paths
}

/// Resolves which config file to read.
///
/// An explicit path is returned as-is (its absence is reported at load
/// time). Without one, the first existing default location wins.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_search_paths().into_iter().find(|p| p.is_file()),
    }
}

/// Load configuration with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. The resolved config file, if any
/// 3. `MAILTRIAGE_*` environment variables
pub fn load_config(explicit: Option<&Path>) -> Result<TriageConfig, figment::Error> {
    build_figment(explicit)?.extract()
}

/// Build the Figment used for config loading.
///
/// Fails when an explicitly requested file does not exist.
pub fn build_figment(explicit: Option<&Path>) -> Result<Figment, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(TriageConfig::default()));

    if let Some(path) = resolve_config_path(explicit) {
        if !path.is_file() {
            return Err(figment::Error::from(format!(
                "config file `{}` does not exist",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), "loading config file");
        figment = match ConfigFormat::from_path(&path) {
            ConfigFormat::Json => figment.merge(Json::file(&path)),
            ConfigFormat::Toml => figment.merge(Toml::file(&path)),
        };
    }

    Ok(figment.merge(env_provider()))
}

/// Load configuration from an in-memory document (no file lookup, no env).
pub fn load_config_from_str(
    content: &str,
    format: ConfigFormat,
) -> Result<TriageConfig, figment::Error> {
    let figment = Figment::new().merge(Serialized::defaults(TriageConfig::default()));
    match format {
        ConfigFormat::Json => figment.merge(Json::string(content)),
        ConfigFormat::Toml => figment.merge(Toml::string(content)),
    }
    .extract()
}

/// Create the environment variable provider with explicit section mapping.
///
/// Only the leading section name is turned into a dot, so
/// `MAILTRIAGE_SETTINGS_SUPPORT_EMAIL` maps to `settings.support_email`
/// rather than `settings.support.email`.
fn env_provider() -> Env {
    Env::prefixed("MAILTRIAGE_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("settings_support_email"),
            "settings.support_email"
        );
        assert_eq!(map_env_key("gateway_port"), "gateway.port");
        assert_eq!(map_env_key("openai_api_key"), "openai.api_key");
        assert_eq!(map_env_key("knowledge_base"), "knowledge_base");
        assert_eq!(map_env_key("bot_version"), "bot_version");
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/mailtriage.toml")),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.json")),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config")),
            ConfigFormat::Json
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = build_figment(Some(Path::new("/nonexistent/mailtriage.json"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
