// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message and configuration fixtures.

use mailtriage_config::TriageConfig;
use mailtriage_core::types::{
    INBOX_LABEL, LabelId, MailMessage, MessageId, MessagePart, ThreadId, UNREAD_LABEL,
};

pub const SUPPORT_EMAIL: &str = "support@example.com";
pub const KNOWLEDGE_BASE: &str = "Our return policy is 30 days. Reset passwords at example.com/reset.";

pub const INTENT_PROMPT: &str = r#"Analyze the following email and classify its primary intent.
Choose one of the following categories:
- "question": The user is asking for help, information, or how to do something.
- "escalation_request": The user is explicitly asking for a human, a support agent, to create a ticket, or expresses strong frustration.
- "other": The post is a general comment, feedback, or does not fit the other categories.

Email: "{email}"

Intent:"#;

pub const REPLY_PROMPT: &str = r#"You are an expert AI assistant for the email thread with subject "{subject}".
Instructions: Use the KNOWLEDGE BASE. Analyze conversation history for context, but focus on the latest post. Be concise.
--- KNOWLEDGE BASE ---
{knowledge_base}"#;

/// A valid configuration with realistic prompts and short intervals.
pub fn test_config() -> TriageConfig {
    let mut config = TriageConfig::default();
    config.settings.support_email = SUPPORT_EMAIL.to_string();
    config.settings.polling_interval_seconds = 1;
    config.prompts.intent_classifier = INTENT_PROMPT.to_string();
    config.prompts.ai_reply_system = REPLY_PROMPT.to_string();
    config.knowledge_base = KNOWLEDGE_BASE.to_string();
    config
}

/// An unread inbox message with a single `text/plain` body.
pub fn inbound_message(id: &str, thread: &str, from: &str, subject: &str, body: &str) -> MailMessage {
    MailMessage {
        id: MessageId(id.to_string()),
        thread_id: ThreadId(thread.to_string()),
        from: from.to_string(),
        date: "Mon, 6 Jan 2025 09:30:00 +0000".to_string(),
        subject: subject.to_string(),
        label_ids: vec![LabelId(INBOX_LABEL.into()), LabelId(UNREAD_LABEL.into())],
        payload: MessagePart::text(body),
    }
}

/// A message previously sent by the agent's own account (already read).
pub fn sent_message(id: &str, thread: &str, from: &str, subject: &str, body: &str) -> MailMessage {
    MailMessage {
        id: MessageId(id.to_string()),
        thread_id: ThreadId(thread.to_string()),
        from: from.to_string(),
        date: "Mon, 6 Jan 2025 09:35:00 +0000".to_string(),
        subject: subject.to_string(),
        label_ids: vec![LabelId("SENT".into())],
        payload: MessagePart::text(body),
    }
}

/// Replaces the payload with a `multipart/alternative` holding plain and HTML bodies.
pub fn with_alternative(mut message: MailMessage, plain: &str, html: &str) -> MailMessage {
    message.payload = MessagePart::multipart(
        "alternative",
        vec![
            MessagePart {
                mime_type: "text/html".to_string(),
                body: Some(html.to_string()),
                parts: Vec::new(),
            },
            MessagePart::text(plain),
        ],
    );
    message
}
