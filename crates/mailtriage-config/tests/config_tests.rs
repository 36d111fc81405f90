// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the mailtriage configuration system.

use std::io::Write;

use mailtriage_config::diagnostic::ConfigError;
use mailtriage_config::{
    ConfigFormat, load_and_validate, load_and_validate_str, load_config_from_str,
};
use serial_test::serial;

const VALID_JSON: &str = r#"{
  "bot_version": "2.1",
  "settings": {
    "openai_model": "gpt-4o-mini",
    "max_intent_tokens": 12,
    "max_reply_tokens": 300,
    "polling_interval_seconds": 30,
    "support_email": "support@example.com"
  },
  "labels": {
    "replied": "Bot/Replied",
    "escalated": "Bot/Escalated",
    "ignored": "Bot/Ignored"
  },
  "prompts": {
    "intent_classifier": "Classify this email: {email}",
    "ai_reply_system": "Thread \"{subject}\". KB: {knowledge_base}"
  },
  "knowledge_base": "Our return policy is 30 days."
}"#;

const VALID_TOML: &str = r#"
knowledge_base = "Returns within 30 days."

[settings]
support_email = "help@example.com"

[prompts]
intent_classifier = "Email: {email}"
ai_reply_system = "Answer about {subject}"

[gateway]
port = 8080
"#;

#[test]
fn valid_json_deserializes_into_triage_config() {
    let config = load_and_validate_str(VALID_JSON, ConfigFormat::Json).expect("valid config");
    assert_eq!(config.bot_version, "2.1");
    assert_eq!(config.settings.openai_model, "gpt-4o-mini");
    assert_eq!(config.settings.max_intent_tokens, 12);
    assert_eq!(config.settings.polling_interval_seconds, 30);
    assert_eq!(config.labels.escalated, "Bot/Escalated");
    assert_eq!(config.knowledge_base, "Our return policy is 30 days.");
    // Untouched sections keep their defaults.
    assert_eq!(config.gateway.port, 5001);
}

#[test]
fn valid_toml_deserializes_into_triage_config() {
    let config = load_and_validate_str(VALID_TOML, ConfigFormat::Toml).expect("valid config");
    assert_eq!(config.settings.support_email, "help@example.com");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.labels.replied, "AI-Replied");
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let json = r#"{"labels": {"replid": "x"}}"#;
    let errors = load_and_validate_str(json, ConfigFormat::Json).unwrap_err();
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("unknown key error");
    assert_eq!(unknown.0, "replid");
    assert_eq!(unknown.1.as_deref(), Some("replied"));
}

#[test]
fn wrong_type_is_reported() {
    let json = r#"{"settings": {"polling_interval_seconds": "often"}}"#;
    let errors = load_and_validate_str(json, ConfigFormat::Json).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "expected invalid type error, got {errors:?}"
    );
}

#[test]
fn malformed_document_is_an_error() {
    assert!(load_config_from_str("{ not json", ConfigFormat::Json).is_err());
}

#[test]
#[serial]
fn explicit_file_is_loaded() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(VALID_JSON.as_bytes()).unwrap();

    let config = load_and_validate(Some(file.path())).expect("file config");
    assert_eq!(config.labels.ignored, "Bot/Ignored");
}

#[test]
#[serial]
fn explicit_missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let errors = load_and_validate(Some(&missing)).unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(VALID_TOML.as_bytes()).unwrap();

    // SAFETY: tests touching the environment are serialized.
    unsafe {
        std::env::set_var("MAILTRIAGE_SETTINGS_SUPPORT_EMAIL", "escalate@example.com");
        std::env::set_var("MAILTRIAGE_GATEWAY_PORT", "9100");
    }
    let result = load_and_validate(Some(file.path()));
    unsafe {
        std::env::remove_var("MAILTRIAGE_SETTINGS_SUPPORT_EMAIL");
        std::env::remove_var("MAILTRIAGE_GATEWAY_PORT");
    }

    let config = result.expect("config with env overrides");
    assert_eq!(config.settings.support_email, "escalate@example.com");
    assert_eq!(config.gateway.port, 9100);
}

#[test]
#[serial]
fn shipped_example_config_is_valid() {
    let content = include_str!("../../../config.example.json");
    let config = load_and_validate_str(content, ConfigFormat::Json)
        .unwrap_or_else(|errors| panic!("example config rejected: {errors:?}"));
    assert_eq!(config.settings.polling_interval_seconds, 60);
    assert_eq!(config.gateway.port, 5001);
    assert!(config.prompts.intent_classifier.contains("{email}"));
}
