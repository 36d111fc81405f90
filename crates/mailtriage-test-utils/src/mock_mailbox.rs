// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory mailbox for deterministic testing.
//!
//! `MockMailbox` implements `MailboxAdapter` over a message store with
//! labels, a small search-query evaluator (`is:unread`, `in:inbox`,
//! `label:"x"`, `-label:"x"`), captured outbound mail and switchable
//! failures.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mailtriage_core::traits::{MailboxAdapter, PluginAdapter};
use mailtriage_core::types::{
    AdapterType, HealthStatus, INBOX_LABEL, Label, LabelChange, LabelId, MailMessage, MessageId,
    MessagePart, MessageSummary, OutgoingMail, SendReceipt, Thread, ThreadId, UNREAD_LABEL,
};
use mailtriage_core::TriageError;

/// Kind of failure a switch injects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// A transient provider error.
    Transient,
    /// An unrecoverable credential error.
    Auth,
}

impl Failure {
    fn into_error(self, what: &str) -> TriageError {
        match self {
            Failure::Transient => TriageError::mailbox(format!("injected {what} failure")),
            Failure::Auth => TriageError::Auth(format!("injected {what} auth failure")),
        }
    }
}

#[derive(Default)]
struct State {
    messages: Vec<MailMessage>,
    labels: Vec<Label>,
    sent: Vec<OutgoingMail>,
    modifications: Vec<(MessageId, LabelChange)>,
    created_labels: Vec<String>,
    list_calls: usize,
    next_id: u32,
    list_failure: Option<Failure>,
    failing_threads: HashSet<ThreadId>,
    failing_recipients: HashSet<String>,
    modify_failure: bool,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn label_name(&self, id: &LabelId) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| &l.id == id)
            .map(|l| l.name.as_str())
    }

    fn has_label_named(&self, msg: &MailMessage, name: &str) -> bool {
        msg.label_ids
            .iter()
            .any(|id| self.label_name(id) == Some(name))
    }

    fn matches(&self, msg: &MailMessage, terms: &[Term]) -> bool {
        terms.iter().all(|term| match term {
            Term::Unread => msg.is_unread(),
            Term::InInbox => msg.label_ids.iter().any(|l| l.0 == INBOX_LABEL),
            Term::Label { name, negated } => self.has_label_named(msg, name) != *negated,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Term {
    Unread,
    InInbox,
    Label { name: String, negated: bool },
}

/// Splits a search query on whitespace outside double quotes.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in query.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_query(query: &str) -> Result<Vec<Term>, TriageError> {
    tokenize(query)
        .into_iter()
        .map(|token| {
            let (negated, body) = match token.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, token.as_str()),
            };
            match body {
                "is:unread" if !negated => Ok(Term::Unread),
                "in:inbox" if !negated => Ok(Term::InInbox),
                _ => match body.strip_prefix("label:") {
                    Some(name) => Ok(Term::Label {
                        name: name.trim_matches('"').to_string(),
                        negated,
                    }),
                    None => Err(TriageError::mailbox(format!(
                        "unsupported query term `{token}`"
                    ))),
                },
            }
        })
        .collect()
}

/// An in-memory mailbox.
#[derive(Clone)]
pub struct MockMailbox {
    own_address: String,
    state: Arc<Mutex<State>>,
}

impl MockMailbox {
    /// Create an empty mailbox owned by `own_address`, with the system
    /// `INBOX` and `UNREAD` labels defined.
    pub fn new(own_address: impl Into<String>) -> Self {
        let state = State {
            labels: [INBOX_LABEL, UNREAD_LABEL, "SENT"]
                .into_iter()
                .map(|name| Label {
                    id: LabelId(name.to_string()),
                    name: name.to_string(),
                })
                .collect(),
            ..State::default()
        };
        Self {
            own_address: own_address.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Store a message. Threads are the messages sharing a thread id, in
    /// insertion order.
    pub async fn add_message(&self, message: MailMessage) {
        self.state.lock().await.messages.push(message);
    }

    /// Define a user label up front, e.g. to simulate an earlier run.
    pub async fn define_label(&self, name: &str) -> LabelId {
        let mut state = self.state.lock().await;
        let id = LabelId(state.next_id("Label"));
        state.labels.push(Label {
            id: id.clone(),
            name: name.to_string(),
        });
        id
    }

    /// Apply a label by name to a stored message, defining it if needed.
    pub async fn apply_label(&self, message_id: &MessageId, name: &str) {
        let existing = {
            let state = self.state.lock().await;
            state
                .labels
                .iter()
                .find(|l| l.name == name)
                .map(|l| l.id.clone())
        };
        let id = match existing {
            Some(id) => id,
            None => self.define_label(name).await,
        };
        let mut state = self.state.lock().await;
        if let Some(msg) = state.messages.iter_mut().find(|m| &m.id == message_id) {
            msg.label_ids.push(id);
        }
    }

    /// Names of every label on a message.
    pub async fn label_names(&self, message_id: &MessageId) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .messages
            .iter()
            .find(|m| &m.id == message_id)
            .map(|m| {
                m.label_ids
                    .iter()
                    .filter_map(|id| state.label_name(id).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get all mail passed to `send()`.
    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.state.lock().await.sent.clone()
    }

    pub async fn modifications(&self) -> Vec<(MessageId, LabelChange)> {
        self.state.lock().await.modifications.clone()
    }

    /// Names passed to `create_label()`.
    pub async fn created_labels(&self) -> Vec<String> {
        self.state.lock().await.created_labels.clone()
    }

    pub async fn list_calls(&self) -> usize {
        self.state.lock().await.list_calls
    }

    pub async fn fail_listing(&self, failure: Option<Failure>) {
        self.state.lock().await.list_failure = failure;
    }

    pub async fn fail_thread(&self, thread_id: &ThreadId) {
        self.state
            .lock()
            .await
            .failing_threads
            .insert(thread_id.clone());
    }

    pub async fn fail_send_to(&self, address: &str) {
        self.state
            .lock()
            .await
            .failing_recipients
            .insert(address.to_string());
    }

    pub async fn fail_modify(&self, fail: bool) {
        self.state.lock().await.modify_failure = fail;
    }
}

#[async_trait]
impl PluginAdapter for MockMailbox {
    fn name(&self) -> &str {
        "mock-mailbox"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Mailbox
    }

    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        Ok(())
    }
}

#[async_trait]
impl MailboxAdapter for MockMailbox {
    async fn own_address(&self) -> Result<String, TriageError> {
        Ok(self.own_address.clone())
    }

    async fn list_candidates(&self, query: &str) -> Result<Vec<MessageSummary>, TriageError> {
        let mut state = self.state.lock().await;
        state.list_calls += 1;
        if let Some(failure) = state.list_failure {
            return Err(failure.into_error("listing"));
        }
        let terms = parse_query(query)?;
        Ok(state
            .messages
            .iter()
            .filter(|m| state.matches(m, &terms))
            .map(|m| MessageSummary {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
                subject: m.subject.clone(),
                from: m.from.clone(),
            })
            .collect())
    }

    async fn get_thread(&self, thread_id: &ThreadId) -> Result<Thread, TriageError> {
        let state = self.state.lock().await;
        if state.failing_threads.contains(thread_id) {
            return Err(TriageError::mailbox("injected thread failure"));
        }
        let messages: Vec<MailMessage> = state
            .messages
            .iter()
            .filter(|m| &m.thread_id == thread_id)
            .cloned()
            .collect();
        if messages.is_empty() {
            return Err(TriageError::NotFound {
                kind: "thread".into(),
                id: thread_id.0.clone(),
            });
        }
        Ok(Thread {
            id: thread_id.clone(),
            messages,
        })
    }

    async fn send(&self, mail: OutgoingMail) -> Result<SendReceipt, TriageError> {
        let mut state = self.state.lock().await;
        if state.failing_recipients.contains(&mail.to) {
            return Err(TriageError::mailbox(format!(
                "injected send failure to {}",
                mail.to
            )));
        }

        let id = MessageId(state.next_id("sent"));
        let thread_id = match &mail.thread_id {
            Some(t) => t.clone(),
            None => ThreadId(state.next_id("thread")),
        };
        let stored = MailMessage {
            id: id.clone(),
            thread_id: thread_id.clone(),
            from: self.own_address.clone(),
            date: String::new(),
            subject: mail.subject.clone(),
            label_ids: vec![LabelId("SENT".into())],
            payload: MessagePart::text(mail.body.clone()),
        };
        state.messages.push(stored);
        state.sent.push(mail);

        Ok(SendReceipt {
            id,
            thread_id: Some(thread_id),
        })
    }

    async fn modify_labels(
        &self,
        message_id: &MessageId,
        change: LabelChange,
    ) -> Result<(), TriageError> {
        let mut state = self.state.lock().await;
        if state.modify_failure {
            return Err(TriageError::mailbox("injected modify failure"));
        }
        let msg = state
            .messages
            .iter_mut()
            .find(|m| &m.id == message_id)
            .ok_or_else(|| TriageError::NotFound {
                kind: "message".into(),
                id: message_id.0.clone(),
            })?;
        msg.label_ids.retain(|l| !change.remove.contains(l));
        for label in &change.add {
            if !msg.label_ids.contains(label) {
                msg.label_ids.push(label.clone());
            }
        }
        state.modifications.push((message_id.clone(), change));
        Ok(())
    }

    async fn list_labels(&self) -> Result<Vec<Label>, TriageError> {
        Ok(self.state.lock().await.labels.clone())
    }

    async fn create_label(&self, name: &str) -> Result<LabelId, TriageError> {
        let mut state = self.state.lock().await;
        if state.labels.iter().any(|l| l.name == name) {
            return Err(TriageError::mailbox(format!("label `{name}` already exists")));
        }
        let id = LabelId(state.next_id("Label"));
        state.labels.push(Label {
            id: id.clone(),
            name: name.to_string(),
        });
        state.created_labels.push(name.to_string());
        Ok(id)
    }
}
