// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the mailbox and oracle adapters and the triage agent.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Provider label marking a message as unread.
pub const UNREAD_LABEL: &str = "UNREAD";

/// Provider label for the inbox.
pub const INBOX_LABEL: &str = "INBOX";

/// Provider-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Provider-assigned thread (conversation) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

/// Provider-assigned label identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Mailbox,
    Oracle,
}

// --- Mailbox types ---

/// A single MIME part of a message, already transfer-decoded by the adapter.
///
/// `body` holds the decoded content of a leaf part. Multipart containers
/// carry their children in `parts` and usually have no body of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePart {
    pub mime_type: String,
    pub body: Option<String>,
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// A leaf `text/plain` part.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            mime_type: "text/plain".to_string(),
            body: Some(body.into()),
            parts: Vec::new(),
        }
    }

    /// A `multipart/*` container.
    pub fn multipart(subtype: &str, parts: Vec<MessagePart>) -> Self {
        Self {
            mime_type: format!("multipart/{subtype}"),
            body: None,
            parts,
        }
    }

    /// Returns true for `multipart/*` containers.
    pub fn is_multipart(&self) -> bool {
        self.mime_type
            .to_ascii_lowercase()
            .starts_with("multipart/")
    }
}

/// A fully fetched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    /// Raw `From` header, possibly in `"Name <addr>"` form.
    pub from: String,
    /// Raw `Date` header.
    pub date: String,
    pub subject: String,
    pub label_ids: Vec<LabelId>,
    pub payload: MessagePart,
}

impl MailMessage {
    /// Whether the message still carries the provider's unread marker.
    pub fn is_unread(&self) -> bool {
        self.label_ids.iter().any(|l| l.0 == UNREAD_LABEL)
    }
}

/// An ordered conversation as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: ThreadId,
    pub messages: Vec<MailMessage>,
}

/// Candidate listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub subject: String,
    pub from: String,
}

/// A message to hand to the provider for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Thread to attach the message to; `None` starts a new conversation.
    pub thread_id: Option<ThreadId>,
}

/// Provider acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub id: MessageId,
    pub thread_id: Option<ThreadId>,
}

/// A provider label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
}

/// Labels to add to and remove from a message in a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelChange {
    pub add: Vec<LabelId>,
    pub remove: Vec<LabelId>,
}

// --- Conversation types ---

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Role {
    /// The external correspondent.
    Sender,
    /// The account the agent operates, including its own earlier replies.
    SelfBot,
}

impl Role {
    /// The chat role this turn takes when replayed to the oracle.
    pub fn chat_role(self) -> ChatRole {
        match self {
            Role::Sender => ChatRole::User,
            Role::SelfBot => ChatRole::Assistant,
        }
    }
}

/// One message of a reconstructed conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

// --- Oracle types ---

/// Role of a message sent to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A message in an oracle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        ChatMessage::new(turn.role.chat_role(), turn.content.clone())
    }
}

/// A completion request to the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    /// Sampling temperature; `None` leaves the provider default.
    pub temperature: Option<f32>,
}

// --- Triage outcome types ---

/// The closed set of sender intents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Question,
    EscalationRequest,
    Other,
}

impl Intent {
    /// Maps an intent label to an intent; anything unrecognised is `Other`.
    pub fn from_label(label: &str) -> Intent {
        label.trim().parse().unwrap_or(Intent::Other)
    }
}

/// How a message was handled; recorded as an exclusive provider label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Disposition {
    Replied,
    Escalated,
    Ignored,
}

impl Disposition {
    /// All dispositions, in ledger order.
    pub const ALL: [Disposition; 3] = [
        Disposition::Replied,
        Disposition::Escalated,
        Disposition::Ignored,
    ];
}
