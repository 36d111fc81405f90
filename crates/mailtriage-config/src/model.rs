// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the mailtriage agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use mailtriage_core::Disposition;
use serde::{Deserialize, Serialize};

/// Top-level mailtriage configuration.
///
/// The `settings`, `labels`, `prompts` and `knowledge_base` keys carry the
/// triage behaviour; the remaining sections configure the adapters and the
/// control surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    /// Free-form version tag of this configuration, reported on the dashboard.
    #[serde(default = "default_bot_version")]
    pub bot_version: String,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub labels: LabelsConfig,

    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Text substituted for `{knowledge_base}` in the reply system prompt.
    #[serde(default)]
    pub knowledge_base: String,

    #[serde(default)]
    pub gmail: GmailConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            bot_version: default_bot_version(),
            agent: AgentConfig::default(),
            settings: SettingsConfig::default(),
            labels: LabelsConfig::default(),
            prompts: PromptsConfig::default(),
            knowledge_base: String::new(),
            gmail: GmailConfig::default(),
            openai: OpenAiConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn default_bot_version() -> String {
    "1.0".to_string()
}

/// Agent behaviour and fixed message texts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Disclosure appended below the signature delimiter of every outbound body.
    #[serde(default = "default_footer")]
    pub footer: String,

    /// Sent in-thread to the sender when a conversation is escalated.
    #[serde(default = "default_acknowledgement")]
    pub acknowledgement: String,

    /// Sent in place of a generated reply when the oracle fails.
    #[serde(default = "default_apology")]
    pub apology: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            footer: default_footer(),
            acknowledgement: default_acknowledgement(),
            apology: default_apology(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_footer() -> String {
    "This response was generated automatically by an AI assistant.".to_string()
}

fn default_acknowledgement() -> String {
    "Thank you for reaching out. Your request has been forwarded to our support team \
     and a human agent will get back to you shortly."
        .to_string()
}

fn default_apology() -> String {
    "I'm sorry, I encountered an error. A human agent will get back to you shortly.".to_string()
}

/// Oracle budgets, polling cadence and escalation target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_max_intent_tokens")]
    pub max_intent_tokens: u32,

    #[serde(default = "default_max_reply_tokens")]
    pub max_reply_tokens: u32,

    /// Seconds slept between poll cycles.
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,

    /// Human support queue receiving escalated transcripts. Required.
    #[serde(default)]
    pub support_email: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            openai_model: default_openai_model(),
            max_intent_tokens: default_max_intent_tokens(),
            max_reply_tokens: default_max_reply_tokens(),
            polling_interval_seconds: default_polling_interval(),
            support_email: String::new(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_intent_tokens() -> u32 {
    10
}

fn default_max_reply_tokens() -> u32 {
    400
}

fn default_polling_interval() -> u64 {
    60
}

/// Provider label names recording each disposition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsConfig {
    #[serde(default = "default_replied_label")]
    pub replied: String,

    #[serde(default = "default_escalated_label")]
    pub escalated: String,

    #[serde(default = "default_ignored_label")]
    pub ignored: String,
}

impl LabelsConfig {
    /// The label name configured for a disposition.
    pub fn name_for(&self, disposition: Disposition) -> &str {
        match disposition {
            Disposition::Replied => &self.replied,
            Disposition::Escalated => &self.escalated,
            Disposition::Ignored => &self.ignored,
        }
    }
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            replied: default_replied_label(),
            escalated: default_escalated_label(),
            ignored: default_ignored_label(),
        }
    }
}

fn default_replied_label() -> String {
    "AI-Replied".to_string()
}

fn default_escalated_label() -> String {
    "AI-Escalated".to_string()
}

fn default_ignored_label() -> String {
    "AI-Ignored".to_string()
}

/// Prompt templates. Both are required; there is no compiled default.
///
/// `intent_classifier` must contain `{email}`. `ai_reply_system` may use
/// `{subject}` and `{knowledge_base}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PromptsConfig {
    #[serde(default)]
    pub intent_classifier: String,

    #[serde(default)]
    pub ai_reply_system: String,
}

/// Gmail mailbox adapter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GmailConfig {
    /// OAuth client secrets downloaded from the Google Cloud console.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,

    /// Authorized-user token file written by `mailtriage auth`.
    #[serde(default = "default_token_path")]
    pub token_path: String,

    #[serde(default = "default_gmail_api_base")]
    pub api_base: String,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Restrict candidates to the inbox.
    #[serde(default = "default_true")]
    pub inbox_only: bool,

    /// Page size for candidate listing.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_path: default_token_path(),
            api_base: default_gmail_api_base(),
            user_id: default_user_id(),
            inbox_only: true,
            max_results: default_max_results(),
        }
    }
}

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_token_path() -> String {
    "token.json".to_string()
}

fn default_gmail_api_base() -> String {
    "https://gmail.googleapis.com".to_string()
}

fn default_user_id() -> String {
    "me".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> u32 {
    100
}

/// OpenAI oracle adapter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_openai_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// HTTP control surface settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum activity entries retained for the dashboard.
    #[serde(default = "default_activity_log_limit")]
    pub activity_log_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
            activity_log_limit: default_activity_log_limit(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_activity_log_limit() -> usize {
    50
}
