// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the mailtriage agent.
//!
//! Provides JSON/TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use mailtriage_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("Polling every {}s", config.settings.polling_interval_seconds);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{ConfigFormat, load_config, load_config_from_str, resolve_config_path};
pub use model::TriageConfig;

/// Load configuration and validate it.
///
/// 1. Loads config from the resolved file + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to miette diagnostics with typo suggestions
pub fn load_and_validate(explicit: Option<&Path>) -> Result<TriageConfig, Vec<ConfigError>> {
    match loader::load_config(explicit) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = collect_sources(explicit);
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Parse an in-memory document and validate it.
pub fn load_and_validate_str(
    content: &str,
    format: ConfigFormat,
) -> Result<TriageConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(content, format) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let name = match format {
                ConfigFormat::Json => "<inline>.json",
                ConfigFormat::Toml => "<inline>.toml",
            };
            let sources = vec![(name.to_string(), content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the resolved config file for error span resolution.
fn collect_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    resolve_config_path(explicit)
        .and_then(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .into_iter()
        .collect()
}
