// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification through the oracle.

use std::sync::Arc;

use mailtriage_config::TriageConfig;
use mailtriage_config::validation::EMAIL_PLACEHOLDER;
use mailtriage_core::traits::OracleAdapter;
use mailtriage_core::types::{ChatMessage, ChatRole, CompletionRequest, Intent};
use tracing::{debug, warn};

/// Maps free-form oracle output to an intent.
///
/// The text is lower-cased and stripped of quote characters, then searched
/// for the intent labels in priority order. Output naming no label is
/// `Other`.
pub fn parse_intent(raw: &str) -> Intent {
    let normalised: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`'))
        .collect();
    let normalised = normalised.trim();

    if normalised.contains("escalation_request") {
        Intent::EscalationRequest
    } else if normalised.contains("question") {
        Intent::Question
    } else {
        Intent::Other
    }
}

/// Substitutes the email body into the classifier prompt.
pub fn render_intent_prompt(template: &str, email: &str) -> String {
    template.replace(EMAIL_PLACEHOLDER, email)
}

/// Asks the oracle which intent the latest inbound message expresses.
pub struct IntentClassifier {
    oracle: Arc<dyn OracleAdapter>,
    template: String,
    model: String,
    max_tokens: u32,
}

impl IntentClassifier {
    pub fn new(oracle: Arc<dyn OracleAdapter>, config: &TriageConfig) -> Self {
        Self {
            oracle,
            template: config.prompts.intent_classifier.clone(),
            model: config.settings.openai_model.clone(),
            max_tokens: config.settings.max_intent_tokens,
        }
    }

    /// Classifies `email`. Oracle failures fall back to `Question`.
    pub async fn classify(&self, email: &str) -> Intent {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::new(
                ChatRole::User,
                render_intent_prompt(&self.template, email),
            )],
            max_tokens: self.max_tokens,
            temperature: Some(0.0),
        };

        match self.oracle.complete(request).await {
            Ok(raw) => {
                let intent = parse_intent(&raw);
                debug!(raw = %raw, intent = %intent, "classified");
                intent
            }
            Err(e) => {
                warn!(error = %e, "intent classification failed, treating as question");
                Intent::Question
            }
        }
    }
}
