// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread reconstruction.
//!
//! Turns a provider thread into an ordered list of conversation turns for
//! the oracle and a plain-text transcript for escalation forwards.

use std::fmt::Write as _;
use std::sync::Arc;

use mailtriage_core::traits::MailboxAdapter;
use mailtriage_core::types::{ConversationTurn, MailMessage, MessagePart, Role, ThreadId};
use mailtriage_core::TriageError;
use tracing::{debug, warn};

/// Marker that opens the footer block of every message the agent sends.
///
/// Text at and after its first occurrence in the agent's own messages is
/// dropped when the thread is replayed.
pub const SIGNATURE_DELIMITER: &str = "\n\n---";

const TRANSCRIPT_RULE_WIDTH: usize = 40;

/// A reconstructed thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    /// Non-empty turns in provider order.
    pub turns: Vec<ConversationTurn>,
    /// Every message of the thread rendered for a human reader.
    pub transcript: String,
}

impl Conversation {
    /// True when there is nothing to triage.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Content of the most recent turn written by the external correspondent.
    pub fn latest_sender_content(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Sender)
            .map(|t| t.content.as_str())
    }
}

/// Extracts the plain-text body of a MIME tree.
///
/// A part carrying body data wins. Otherwise the `text/plain` child is
/// preferred, then nested multipart containers are searched depth-first.
/// Returns an empty string when no text is found.
pub fn extract_plain_text(part: &MessagePart) -> String {
    find_text(part).map(str::trim).unwrap_or_default().to_string()
}

fn find_text(part: &MessagePart) -> Option<&str> {
    if let Some(body) = part.body.as_deref()
        && !body.is_empty()
    {
        return Some(body);
    }

    if let Some(text) = part
        .parts
        .iter()
        .filter(|p| p.mime_type.eq_ignore_ascii_case("text/plain"))
        .find_map(find_text)
    {
        return Some(text);
    }

    part.parts
        .iter()
        .filter(|p| p.is_multipart())
        .find_map(find_text)
}

/// Returns the `addr` of a `"Name <addr>"` header, or the trimmed header.
pub fn bare_address(header: &str) -> &str {
    if let Some(start) = header.find('<') {
        let rest = &header[start + 1..];
        if let Some(end) = rest.find('>')
            && end > 0
        {
            return rest[..end].trim();
        }
    }
    header.trim()
}

/// Drops the signature block and everything after it.
pub fn strip_signature(body: &str) -> &str {
    match body.find(SIGNATURE_DELIMITER) {
        Some(idx) => &body[..idx],
        None => body,
    }
}

/// Builds turns and transcript from the messages of one thread.
pub fn build_conversation(messages: &[MailMessage], own_address: &str) -> Conversation {
    let mut conversation = Conversation::default();
    let rule = "=".repeat(TRANSCRIPT_RULE_WIDTH);

    for message in messages {
        let role = if bare_address(&message.from) == own_address {
            Role::SelfBot
        } else {
            Role::Sender
        };

        let mut body = extract_plain_text(&message.payload);
        if role == Role::SelfBot {
            body = strip_signature(&body).trim().to_string();
        }

        let _ = write!(
            conversation.transcript,
            "From: {}\nDate: {}\n\n{}\n\n{}\n\n",
            message.from, message.date, body, rule
        );

        if body.is_empty() {
            debug!(message_id = %message.id, "skipping empty turn");
            continue;
        }
        conversation.turns.push(ConversationTurn {
            role,
            content: body,
        });
    }

    conversation
}

/// Fetches threads and reconstructs them from the agent's point of view.
pub struct ThreadReconstructor {
    mailbox: Arc<dyn MailboxAdapter>,
    own_address: String,
}

impl ThreadReconstructor {
    pub fn new(mailbox: Arc<dyn MailboxAdapter>, own_address: impl Into<String>) -> Self {
        Self {
            mailbox,
            own_address: own_address.into(),
        }
    }

    /// Reconstructs a thread.
    ///
    /// A failed lookup yields an empty conversation, which callers skip.
    /// Credential failures are still returned so the worker can stop.
    pub async fn reconstruct(&self, thread_id: &ThreadId) -> Result<Conversation, TriageError> {
        match self.mailbox.get_thread(thread_id).await {
            Ok(thread) => Ok(build_conversation(&thread.messages, &self.own_address)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(thread_id = %thread_id, error = %e, "thread lookup failed");
                Ok(Conversation::default())
            }
        }
    }
}
