// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Oracle adapter trait for hosted language-model completions.

use async_trait::async_trait;

use crate::error::TriageError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CompletionRequest;

/// Adapter for a text-completion service.
#[async_trait]
pub trait OracleAdapter: PluginAdapter {
    /// Sends a chat-style request and returns the text of the first choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String, TriageError>;
}
