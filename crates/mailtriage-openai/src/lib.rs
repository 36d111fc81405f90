// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI oracle adapter for the mailtriage agent.
//!
//! Implements [`OracleAdapter`] over the chat completions endpoint. Every
//! transport, authentication, quota or decoding failure surfaces as a single
//! `Err`; callers decide the fallback.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use mailtriage_config::model::OpenAiConfig;
use mailtriage_core::{
    AdapterType, CompletionRequest, HealthStatus, OracleAdapter, PluginAdapter, TriageError,
};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::ChatCompletionRequest;

/// Environment variable consulted when the config carries no key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI oracle implementing [`OracleAdapter`].
pub struct OpenAiOracle {
    client: OpenAiClient,
}

impl OpenAiOracle {
    /// Creates an oracle from the `[openai]` config section.
    ///
    /// API key resolution order: `openai.api_key` -> `OPENAI_API_KEY` -> error.
    pub fn new(config: &OpenAiConfig) -> Result<Self, TriageError> {
        let api_key = resolve_api_key(&config.api_key, std::env::var(API_KEY_ENV).ok())?;
        let client = OpenAiClient::new(
            &api_key,
            &config.api_base,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(api_base = %config.api_base, "OpenAI oracle initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for OpenAiOracle {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        // No probe call: it would spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        debug!("OpenAI oracle shutting down");
        Ok(())
    }
}

#[async_trait]
impl OracleAdapter for OpenAiOracle {
    async fn complete(&self, request: CompletionRequest) -> Result<String, TriageError> {
        let api_request = ChatCompletionRequest {
            model: request.model,
            messages: request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self.client.chat_completion(&api_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TriageError::oracle("completion returned no choices"))?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                finish_reason = choice.finish_reason.as_deref().unwrap_or(""),
                "completion usage"
            );
        }

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

fn resolve_api_key(
    config_key: &Option<String>,
    env_key: Option<String>,
) -> Result<SecretString, TriageError> {
    if let Some(key) = config_key
        && !key.trim().is_empty()
    {
        return Ok(SecretString::from(key.trim().to_string()));
    }

    match env_key {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_string())),
        _ => Err(TriageError::Config(format!(
            "OpenAI API key not found. Set openai.api_key in config or the {API_KEY_ENV} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailtriage_core::{ChatMessage, ChatRole};
    use secrecy::ExposeSecret;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oracle_for(server: &MockServer) -> OpenAiOracle {
        let config = OpenAiConfig {
            api_key: Some("sk-test".into()),
            api_base: server.uri(),
            timeout_secs: 5,
        };
        OpenAiOracle::new(&config).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![
                ChatMessage::new(ChatRole::System, "be brief"),
                ChatMessage::new(ChatRole::User, "hello"),
            ],
            max_tokens: 400,
            temperature: None,
        }
    }

    #[test]
    fn config_key_wins_over_env() {
        let key = resolve_api_key(&Some("sk-config".into()), Some("sk-env".into())).unwrap();
        assert_eq!(key.expose_secret(), "sk-config");
    }

    #[test]
    fn empty_config_key_falls_back_to_env() {
        let key = resolve_api_key(&Some("  ".into()), Some("sk-env".into())).unwrap();
        assert_eq!(key.expose_secret(), "sk-env");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = resolve_api_key(&None, None).unwrap_err();
        assert!(matches!(err, TriageError::Config(_)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[tokio::test]
    async fn complete_returns_trimmed_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c1",
                "choices": [
                    {"message": {"content": "  Our policy is 30 days.\n"}, "finish_reason": "stop"},
                    {"message": {"content": "second"}, "finish_reason": "stop"}
                ]
            })))
            .mount(&server)
            .await;

        let text = oracle_for(&server).complete(request()).await.unwrap();
        assert_eq!(text, "Our policy is 30 days.");
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "c2", "choices": []})),
            )
            .mount(&server)
            .await;

        let err = oracle_for(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, TriageError::Oracle { .. }));
    }

    #[tokio::test]
    async fn unauthorized_is_an_oracle_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = oracle_for(&server).complete(request()).await.unwrap_err();
        assert!(err.to_string().contains("Incorrect API key"), "got: {err}");
    }

    #[tokio::test]
    async fn adapter_identity() {
        let server = MockServer::start().await;
        let oracle = oracle_for(&server);
        assert_eq!(oracle.name(), "openai");
        assert_eq!(oracle.adapter_type(), AdapterType::Oracle);
        assert_eq!(oracle.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
