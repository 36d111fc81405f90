// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent-driven actions: reply, escalate, or ignore.

use std::sync::Arc;

use mailtriage_config::TriageConfig;
use mailtriage_core::traits::{MailboxAdapter, OracleAdapter};
use mailtriage_core::types::{
    ChatMessage, ChatRole, CompletionRequest, Disposition, Intent, MessageSummary, OutgoingMail,
};
use mailtriage_core::TriageError;
use tracing::{debug, info, warn};

use crate::reconstruct::{Conversation, SIGNATURE_DELIMITER, bare_address};

const SUBJECT_PLACEHOLDER: &str = "{subject}";
const KNOWLEDGE_BASE_PLACEHOLDER: &str = "{knowledge_base}";

/// Prefixes `Re: ` unless the subject already carries a reply prefix.
pub fn reply_subject(subject: &str) -> String {
    if subject.to_lowercase().starts_with("re:") {
        subject.to_string()
    } else {
        format!("Re: {subject}")
    }
}

/// Appends the disclosure footer below the signature delimiter.
pub fn with_footer(body: &str, footer: &str) -> String {
    format!("{body}{SIGNATURE_DELIMITER}\n{footer}")
}

pub fn forward_subject(sender: &str, subject: &str) -> String {
    format!("Escalated Support Request from {sender}: {subject}")
}

pub fn forward_body(sender: &str, transcript: &str) -> String {
    format!(
        "This email thread from {sender} has been automatically escalated for human review.\n\n\
         --- Full Conversation History ---\n\n{transcript}"
    )
}

/// Fills the reply system prompt.
pub fn render_reply_prompt(template: &str, subject: &str, knowledge_base: &str) -> String {
    template
        .replace(SUBJECT_PLACEHOLDER, subject)
        .replace(KNOWLEDGE_BASE_PLACEHOLDER, knowledge_base)
}

/// Performs the outbound side effects for a classified message.
///
/// Sends happen before the disposition is returned; committing the
/// disposition label is left to the caller.
pub struct ActionDispatcher {
    mailbox: Arc<dyn MailboxAdapter>,
    oracle: Arc<dyn OracleAdapter>,
    model: String,
    max_reply_tokens: u32,
    reply_template: String,
    knowledge_base: String,
    support_email: String,
    footer: String,
    acknowledgement: String,
    apology: String,
}

impl ActionDispatcher {
    pub fn new(
        mailbox: Arc<dyn MailboxAdapter>,
        oracle: Arc<dyn OracleAdapter>,
        config: &TriageConfig,
    ) -> Self {
        Self {
            mailbox,
            oracle,
            model: config.settings.openai_model.clone(),
            max_reply_tokens: config.settings.max_reply_tokens,
            reply_template: config.prompts.ai_reply_system.clone(),
            knowledge_base: config.knowledge_base.clone(),
            support_email: config.settings.support_email.clone(),
            footer: config.agent.footer.clone(),
            acknowledgement: config.agent.acknowledgement.clone(),
            apology: config.agent.apology.clone(),
        }
    }

    /// Acts on `intent` and reports the resulting disposition.
    ///
    /// Send failures are returned; the message then stays unlabeled.
    pub async fn dispatch(
        &self,
        intent: Intent,
        message: &MessageSummary,
        conversation: &Conversation,
    ) -> Result<Disposition, TriageError> {
        match intent {
            Intent::Question => {
                self.reply(message, conversation).await?;
                Ok(Disposition::Replied)
            }
            Intent::EscalationRequest => {
                self.escalate(message, conversation).await?;
                Ok(Disposition::Escalated)
            }
            Intent::Other => {
                debug!(message_id = %message.id, "no action for message");
                Ok(Disposition::Ignored)
            }
        }
    }

    async fn reply(
        &self,
        message: &MessageSummary,
        conversation: &Conversation,
    ) -> Result<(), TriageError> {
        let text = self.generate_reply(&message.subject, conversation).await;
        let receipt = self
            .mailbox
            .send(OutgoingMail {
                to: bare_address(&message.from).to_string(),
                subject: reply_subject(&message.subject),
                body: with_footer(&text, &self.footer),
                thread_id: Some(message.thread_id.clone()),
            })
            .await?;
        info!(message_id = %message.id, sent_id = %receipt.id, "reply sent");
        Ok(())
    }

    /// Asks the oracle for a reply; falls back to the apology text.
    pub async fn generate_reply(&self, subject: &str, conversation: &Conversation) -> String {
        let mut messages = Vec::with_capacity(conversation.turns.len() + 1);
        messages.push(ChatMessage::new(
            ChatRole::System,
            render_reply_prompt(&self.reply_template, subject, &self.knowledge_base),
        ));
        messages.extend(conversation.turns.iter().map(ChatMessage::from));

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_reply_tokens,
            temperature: None,
        };

        match self.oracle.complete(request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "reply generation failed, sending apology");
                self.apology.clone()
            }
        }
    }

    async fn escalate(
        &self,
        message: &MessageSummary,
        conversation: &Conversation,
    ) -> Result<(), TriageError> {
        let body = forward_body(&message.from, &conversation.transcript);
        self.mailbox
            .send(OutgoingMail {
                to: self.support_email.clone(),
                subject: forward_subject(&message.from, &message.subject),
                body: with_footer(&body, &self.footer),
                thread_id: None,
            })
            .await?;
        info!(message_id = %message.id, to = %self.support_email, "conversation escalated");

        // The forward went out, so the message counts as escalated.
        if let Err(e) = self
            .mailbox
            .send(OutgoingMail {
                to: bare_address(&message.from).to_string(),
                subject: reply_subject(&message.subject),
                body: with_footer(&self.acknowledgement, &self.footer),
                thread_id: Some(message.thread_id.clone()),
            })
            .await
        {
            warn!(message_id = %message.id, error = %e, "escalation acknowledgement failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailtriage_core::types::{MessageId, Role, ThreadId};
    use mailtriage_test_utils::fixtures::{KNOWLEDGE_BASE, SUPPORT_EMAIL};
    use mailtriage_test_utils::{MockMailbox, MockOracle, inbound_message, test_config};

    use crate::reconstruct::build_conversation;

    const OWN: &str = "bot@example.com";
    const SENDER: &str = "Jane Doe <jane@example.com>";

    fn summary(subject: &str) -> MessageSummary {
        MessageSummary {
            id: MessageId("m1".into()),
            thread_id: ThreadId("t1".into()),
            subject: subject.into(),
            from: SENDER.into(),
        }
    }

    fn conversation(body: &str) -> Conversation {
        build_conversation(
            &[inbound_message("m1", "t1", SENDER, "Help", body)],
            OWN,
        )
    }

    fn dispatcher(mailbox: &MockMailbox, oracle: &MockOracle) -> ActionDispatcher {
        ActionDispatcher::new(
            Arc::new(mailbox.clone()),
            Arc::new(oracle.clone()),
            &test_config(),
        )
    }

    #[test]
    fn reply_subject_prefix_rules() {
        assert_eq!(reply_subject("Help"), "Re: Help");
        assert_eq!(reply_subject("RE: Help"), "RE: Help");
        assert_eq!(reply_subject("re:Help"), "re:Help");
        assert_eq!(reply_subject("Regarding order"), "Re: Regarding order");
    }

    #[test]
    fn footer_starts_with_signature_delimiter() {
        let body = with_footer("Hello", "Automated.");
        assert_eq!(body, "Hello\n\n---\nAutomated.");
        assert_eq!(crate::reconstruct::strip_signature(&body), "Hello");
    }

    #[test]
    fn forward_texts() {
        assert_eq!(
            forward_subject("a@example.com", "Broken"),
            "Escalated Support Request from a@example.com: Broken"
        );
        assert_eq!(
            forward_body("a@example.com", "T"),
            "This email thread from a@example.com has been automatically escalated for human review.\n\n--- Full Conversation History ---\n\nT"
        );
    }

    #[test]
    fn reply_prompt_fills_placeholders() {
        assert_eq!(
            render_reply_prompt("S={subject} KB={knowledge_base}", "Help", "kb"),
            "S=Help KB=kb"
        );
    }

    #[tokio::test]
    async fn question_sends_threaded_reply_with_footer() {
        let mailbox = MockMailbox::new(OWN);
        let oracle = MockOracle::with_responses(["  Visit example.com/reset.  "]);
        let config = test_config();

        let disposition = dispatcher(&mailbox, &oracle)
            .dispatch(Intent::Question, &summary("Help"), &conversation("How?"))
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::Replied);

        let sent = mailbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert_eq!(sent[0].subject, "Re: Help");
        assert_eq!(sent[0].thread_id, Some(ThreadId("t1".into())));
        assert_eq!(
            sent[0].body,
            format!("Visit example.com/reset.\n\n---\n{}", config.agent.footer)
        );

        let requests = oracle.requests().await;
        let request = &requests[0];
        assert_eq!(request.max_tokens, config.settings.max_reply_tokens);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert!(request.messages[0].content.contains(KNOWLEDGE_BASE));
        assert!(request.messages[0].content.contains("\"Help\""));
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert_eq!(request.messages[1].content, "How?");
    }

    #[tokio::test]
    async fn reply_replays_prior_bot_turns_as_assistant() {
        let mailbox = MockMailbox::new(OWN);
        let oracle = MockOracle::with_responses(["ok"]);
        let conv = Conversation {
            turns: vec![
                mailtriage_core::types::ConversationTurn {
                    role: Role::Sender,
                    content: "first".into(),
                },
                mailtriage_core::types::ConversationTurn {
                    role: Role::SelfBot,
                    content: "answer".into(),
                },
            ],
            transcript: String::new(),
        };
        dispatcher(&mailbox, &oracle)
            .dispatch(Intent::Question, &summary("Help"), &conv)
            .await
            .unwrap();
        let roles: Vec<ChatRole> = oracle.requests().await[0]
            .messages
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant]
        );
    }

    #[tokio::test]
    async fn reply_failure_sends_apology_and_still_replies() {
        let mailbox = MockMailbox::new(OWN);
        let oracle = MockOracle::new();
        oracle.push_failure("quota exceeded").await;
        let config = test_config();

        let disposition = dispatcher(&mailbox, &oracle)
            .dispatch(Intent::Question, &summary("Help"), &conversation("How?"))
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::Replied);
        let sent = mailbox.sent().await;
        assert!(sent[0].body.starts_with(&config.agent.apology));
    }

    #[tokio::test]
    async fn escalation_forwards_then_acknowledges() {
        let mailbox = MockMailbox::new(OWN);
        let oracle = MockOracle::new();
        let conv = conversation("I want a human");

        let disposition = dispatcher(&mailbox, &oracle)
            .dispatch(Intent::EscalationRequest, &summary("Angry"), &conv)
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::Escalated);
        assert_eq!(oracle.request_count().await, 0);

        let sent = mailbox.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, SUPPORT_EMAIL);
        assert_eq!(sent[0].thread_id, None);
        assert_eq!(
            sent[0].subject,
            format!("Escalated Support Request from {SENDER}: Angry")
        );
        assert!(sent[0].body.contains(&conv.transcript));
        assert!(sent[0].body.contains("I want a human"));

        assert_eq!(sent[1].to, "jane@example.com");
        assert_eq!(sent[1].subject, "Re: Angry");
        assert_eq!(sent[1].thread_id, Some(ThreadId("t1".into())));
        assert!(sent[1].body.starts_with(&test_config().agent.acknowledgement));
    }

    #[tokio::test]
    async fn failed_forward_skips_acknowledgement() {
        let mailbox = MockMailbox::new(OWN);
        mailbox.fail_send_to(SUPPORT_EMAIL).await;
        let oracle = MockOracle::new();

        let result = dispatcher(&mailbox, &oracle)
            .dispatch(
                Intent::EscalationRequest,
                &summary("Angry"),
                &conversation("human please"),
            )
            .await;
        assert!(result.is_err());
        assert!(mailbox.sent().await.is_empty());
    }

    #[tokio::test]
    async fn failed_acknowledgement_still_escalates() {
        let mailbox = MockMailbox::new(OWN);
        mailbox.fail_send_to("jane@example.com").await;
        let oracle = MockOracle::new();

        let disposition = dispatcher(&mailbox, &oracle)
            .dispatch(
                Intent::EscalationRequest,
                &summary("Angry"),
                &conversation("human please"),
            )
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::Escalated);
        let sent = mailbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, SUPPORT_EMAIL);
    }

    #[tokio::test]
    async fn other_sends_nothing() {
        let mailbox = MockMailbox::new(OWN);
        let oracle = MockOracle::new();
        let disposition = dispatcher(&mailbox, &oracle)
            .dispatch(Intent::Other, &summary("Thanks"), &conversation("Thanks!"))
            .await
            .unwrap();
        assert_eq!(disposition, Disposition::Ignored);
        assert!(mailbox.sent().await.is_empty());
        assert_eq!(oracle.request_count().await, 0);
    }

    #[tokio::test]
    async fn every_intent_maps_to_a_distinct_disposition() {
        let mut seen = Vec::new();
        for label in ["question", "escalation_request", "other", "nonsense"] {
            let mailbox = MockMailbox::new(OWN);
            let oracle = MockOracle::new();
            let disposition = dispatcher(&mailbox, &oracle)
                .dispatch(
                    Intent::from_label(label),
                    &summary("s"),
                    &conversation("body"),
                )
                .await
                .unwrap();
            seen.push(disposition);
        }
        assert_eq!(
            seen,
            vec![
                Disposition::Replied,
                Disposition::Escalated,
                Disposition::Ignored,
                Disposition::Ignored
            ]
        );
    }
}
