// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: required prompts and their placeholders, distinct label
//! names, positive budgets and intervals, and a usable support address.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::TriageConfig;

/// Placeholder the intent classifier prompt must contain.
pub const EMAIL_PLACEHOLDER: &str = "{email}";

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TriageConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let prompts = &config.prompts;
    if prompts.intent_classifier.trim().is_empty() {
        errors.push(ConfigError::validation(
            "prompts.intent_classifier must not be empty",
        ));
    } else if !prompts.intent_classifier.contains(EMAIL_PLACEHOLDER) {
        errors.push(ConfigError::validation(format!(
            "prompts.intent_classifier must contain the `{EMAIL_PLACEHOLDER}` placeholder"
        )));
    }

    if prompts.ai_reply_system.trim().is_empty() {
        errors.push(ConfigError::validation(
            "prompts.ai_reply_system must not be empty",
        ));
    }

    let labels = [
        ("labels.replied", &config.labels.replied),
        ("labels.escalated", &config.labels.escalated),
        ("labels.ignored", &config.labels.ignored),
    ];
    let mut seen = HashSet::new();
    for (key, name) in labels {
        if name.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        } else if !seen.insert(name.trim()) {
            errors.push(ConfigError::validation(format!(
                "{key} `{name}` duplicates another disposition label"
            )));
        }
    }

    let settings = &config.settings;
    if settings.polling_interval_seconds < 1 {
        errors.push(ConfigError::validation(
            "settings.polling_interval_seconds must be at least 1",
        ));
    }
    if settings.max_intent_tokens < 1 {
        errors.push(ConfigError::validation(
            "settings.max_intent_tokens must be at least 1",
        ));
    }
    if settings.max_reply_tokens < 1 {
        errors.push(ConfigError::validation(
            "settings.max_reply_tokens must be at least 1",
        ));
    }
    if settings.openai_model.trim().is_empty() {
        errors.push(ConfigError::validation(
            "settings.openai_model must not be empty",
        ));
    }

    let support = settings.support_email.trim();
    if support.is_empty() {
        errors.push(ConfigError::validation(
            "settings.support_email must be set",
        ));
    } else if !support.contains('@') {
        errors.push(ConfigError::validation(format!(
            "settings.support_email `{support}` is not an email address"
        )));
    }

    if config.gateway.activity_log_limit < 1 {
        errors.push(ConfigError::validation(
            "gateway.activity_log_limit must be at least 1",
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

    fn valid_config() -> TriageConfig {
        let mut config = TriageConfig::default();
        config.prompts.intent_classifier = "Classify: {email}".into();
        config.prompts.ai_reply_system = "Subject {subject}. KB: {knowledge_base}".into();
        config.settings.support_email = "support@example.com".into();
        config
    }

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn filled_config_validates() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn default_config_is_rejected() {
        let errors = validate_config(&TriageConfig::default()).unwrap_err();
        assert!(has_error(&errors, "prompts.intent_classifier"));
        assert!(has_error(&errors, "prompts.ai_reply_system"));
        assert!(has_error(&errors, "support_email"));
    }

    #[test]
    fn intent_prompt_needs_placeholder() {
        let mut config = valid_config();
        config.prompts.intent_classifier = "Classify the email".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "{email}"));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let mut config = valid_config();
        config.labels.ignored = config.labels.replied.clone();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "labels.ignored"));
    }

    #[test]
    fn zero_interval_and_budgets_are_rejected() {
        let mut config = valid_config();
        config.settings.polling_interval_seconds = 0;
        config.settings.max_intent_tokens = 0;
        config.settings.max_reply_tokens = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn support_email_must_look_like_an_address() {
        let mut config = valid_config();
        config.settings.support_email = "support".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "not an email address"));
    }
}
