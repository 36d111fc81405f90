// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock oracle adapter for deterministic testing.
//!
//! `MockOracle` implements `OracleAdapter` with pre-configured responses and
//! records every request for assertions.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mailtriage_core::traits::{OracleAdapter, PluginAdapter};
use mailtriage_core::types::{AdapterType, CompletionRequest, HealthStatus};
use mailtriage_core::TriageError;

/// A scripted oracle.
///
/// Responses are popped from a FIFO queue; an `Err` entry is returned as an
/// oracle failure. When the queue is empty, "mock response" is returned.
#[derive(Clone, Default)]
pub struct MockOracle {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an oracle pre-loaded with successful responses.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().map(|r| Ok(r.into())).collect(),
            )),
            requests: Arc::default(),
        }
    }

    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure (transport, quota, ...).
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockOracle {
    fn name(&self) -> &str {
        "mock-oracle"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        Ok(())
    }
}

#[async_trait]
impl OracleAdapter for MockOracle {
    async fn complete(&self, request: CompletionRequest) -> Result<String, TriageError> {
        self.requests.lock().await.push(request);
        match self.responses.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(TriageError::oracle(message)),
            None => Ok("mock response".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailtriage_core::{ChatMessage, ChatRole};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            messages: vec![ChatMessage::new(ChatRole::User, "hi")],
            max_tokens: 5,
            temperature: Some(0.0),
        }
    }

    #[tokio::test]
    async fn responses_are_served_in_order_then_default() {
        let oracle = MockOracle::with_responses(["question", "answer"]);
        assert_eq!(oracle.complete(request()).await.unwrap(), "question");
        assert_eq!(oracle.complete(request()).await.unwrap(), "answer");
        assert_eq!(oracle.complete(request()).await.unwrap(), "mock response");
        assert_eq!(oracle.request_count().await, 3);
    }

    #[tokio::test]
    async fn queued_failure_is_an_oracle_error() {
        let oracle = MockOracle::new();
        oracle.push_failure("connection reset").await;
        let err = oracle.complete(request()).await.unwrap_err();
        assert!(matches!(err, TriageError::Oracle { .. }));
        assert_eq!(oracle.requests().await[0].max_tokens, 5);
    }
}
