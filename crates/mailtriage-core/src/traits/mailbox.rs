// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mailbox adapter trait for hosted mail providers.

use async_trait::async_trait;

use crate::error::TriageError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Label, LabelChange, LabelId, MessageId, MessageSummary, OutgoingMail, SendReceipt, Thread,
    ThreadId,
};

/// Adapter for an authenticated mailbox.
///
/// All label operations are addressed by provider label id. Name-to-id
/// resolution is the caller's concern (see `list_labels` / `create_label`).
#[async_trait]
pub trait MailboxAdapter: PluginAdapter {
    /// The bare email address of the authenticated account.
    async fn own_address(&self) -> Result<String, TriageError>;

    /// Lists messages matching a provider search query.
    async fn list_candidates(&self, query: &str) -> Result<Vec<MessageSummary>, TriageError>;

    /// Fetches a whole thread with every message in provider order.
    async fn get_thread(&self, thread_id: &ThreadId) -> Result<Thread, TriageError>;

    /// Sends a message, threaded when `mail.thread_id` is set.
    async fn send(&self, mail: OutgoingMail) -> Result<SendReceipt, TriageError>;

    /// Applies label additions and removals to one message in a single request.
    async fn modify_labels(
        &self,
        message_id: &MessageId,
        change: LabelChange,
    ) -> Result<(), TriageError>;

    /// Lists every label defined in the mailbox.
    async fn list_labels(&self) -> Result<Vec<Label>, TriageError>;

    /// Creates a user label and returns its id.
    async fn create_label(&self, name: &str) -> Result<LabelId, TriageError>;
}
