// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the mailtriage agent.
//!
//! This crate provides the adapter traits, error type, and domain types
//! shared by the mailbox and oracle adapters and the triage pipeline.

pub mod error;
pub mod traits;
pub mod types;

pub use error::TriageError;
pub use types::{
    AdapterType, ChatMessage, ChatRole, CompletionRequest, ConversationTurn, Disposition,
    HealthStatus, INBOX_LABEL, Intent, Label, LabelChange, LabelId, MailMessage, MessageId,
    MessagePart, MessageSummary, OutgoingMail, Role, SendReceipt, Thread, ThreadId, UNREAD_LABEL,
};

pub use traits::{MailboxAdapter, OracleAdapter, PluginAdapter};
