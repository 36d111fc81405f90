// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gmail mailbox adapter for the mailtriage agent.
//!
//! Implements [`MailboxAdapter`] over the Gmail REST API with OAuth
//! credentials from an authorized-user token file.

pub mod auth;
pub mod client;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use mailtriage_config::model::GmailConfig;
use mailtriage_core::{
    AdapterType, HealthStatus, Label, LabelChange, LabelId, MailMessage, MailboxAdapter,
    MessageId, MessageSummary, OutgoingMail, PluginAdapter, SendReceipt, Thread, ThreadId,
    TriageError,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::auth::TokenStore;
use crate::client::GmailClient;
use crate::types::{ModifyRequest, SendRequest};

/// Gmail mailbox implementing [`MailboxAdapter`].
pub struct GmailMailbox {
    client: GmailClient,
    max_results: u32,
    own_address: OnceCell<String>,
}

impl GmailMailbox {
    /// Opens the mailbox described by the `[gmail]` config section.
    ///
    /// Fails with [`TriageError::Auth`] when no token file exists yet.
    pub async fn connect(config: &GmailConfig) -> Result<Self, TriageError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TriageError::Mailbox {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        let tokens = TokenStore::open(Path::new(&config.token_path), http.clone()).await?;
        let client = GmailClient::new(http, &config.api_base, &config.user_id, Arc::new(tokens));

        info!(api_base = %config.api_base, "Gmail mailbox initialized");
        Ok(Self::with_client(client, config.max_results))
    }

    pub fn with_client(client: GmailClient, max_results: u32) -> Self {
        Self {
            client,
            max_results,
            own_address: OnceCell::new(),
        }
    }

    fn build_raw(&self, from: &str, mail: &OutgoingMail) -> Result<String, TriageError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| TriageError::mailbox(format!("invalid sender address `{from}`: {e}")))?;
        let to: Mailbox = mail.to.parse().map_err(|e| {
            TriageError::mailbox(format!("invalid recipient address `{}`: {e}", mail.to))
        })?;

        let message = lettre::Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| TriageError::mailbox(format!("cannot build message: {e}")))?;

        Ok(URL_SAFE.encode(message.formatted()))
    }
}

#[async_trait]
impl PluginAdapter for GmailMailbox {
    fn name(&self) -> &str {
        "gmail"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Mailbox
    }

    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        match self.client.profile().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e @ TriageError::Auth(_)) => Ok(HealthStatus::Unhealthy(e.to_string())),
            Err(e) => Ok(HealthStatus::Degraded(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        debug!("Gmail mailbox shutting down");
        Ok(())
    }
}

#[async_trait]
impl MailboxAdapter for GmailMailbox {
    async fn own_address(&self) -> Result<String, TriageError> {
        self.own_address
            .get_or_try_init(|| async {
                let profile = self.client.profile().await?;
                Ok::<_, TriageError>(profile.email_address.trim().to_string())
            })
            .await
            .cloned()
    }

    async fn list_candidates(&self, query: &str) -> Result<Vec<MessageSummary>, TriageError> {
        let list = self.client.list_messages(query, self.max_results).await?;
        debug!(query, count = list.messages.len(), "listed candidates");

        let mut summaries = Vec::with_capacity(list.messages.len());
        for entry in list.messages {
            let meta = match self.client.message_metadata(&entry.id).await {
                Ok(meta) => meta,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(message_id = %entry.id, error = %e, "skipping candidate without metadata");
                    continue;
                }
            };
            let payload = meta.payload.unwrap_or_default();
            summaries.push(MessageSummary {
                id: MessageId(entry.id),
                thread_id: ThreadId(entry.thread_id),
                subject: payload.header("Subject").unwrap_or_default().to_string(),
                from: payload.header("From").unwrap_or_default().to_string(),
            });
        }
        Ok(summaries)
    }

    async fn get_thread(&self, thread_id: &ThreadId) -> Result<Thread, TriageError> {
        let thread = self.client.thread(&thread_id.0).await?;
        Ok(Thread {
            id: ThreadId(thread.id),
            messages: thread.messages.into_iter().map(MailMessage::from).collect(),
        })
    }

    async fn send(&self, mail: OutgoingMail) -> Result<SendReceipt, TriageError> {
        let from = self.own_address().await?;
        let raw = self.build_raw(&from, &mail)?;
        let response = self
            .client
            .send(&SendRequest {
                raw,
                thread_id: mail.thread_id.map(|t| t.0),
            })
            .await?;
        debug!(message_id = %response.id, to = %mail.to, "message sent");
        Ok(SendReceipt {
            id: MessageId(response.id),
            thread_id: response.thread_id.map(ThreadId),
        })
    }

    async fn modify_labels(
        &self,
        message_id: &MessageId,
        change: LabelChange,
    ) -> Result<(), TriageError> {
        let request = ModifyRequest {
            add_label_ids: change.add.into_iter().map(|l| l.0).collect(),
            remove_label_ids: change.remove.into_iter().map(|l| l.0).collect(),
        };
        self.client.modify(&message_id.0, &request).await
    }

    async fn list_labels(&self) -> Result<Vec<Label>, TriageError> {
        let list = self.client.labels().await?;
        Ok(list
            .labels
            .into_iter()
            .map(|l| Label {
                id: LabelId(l.id),
                name: l.name,
            })
            .collect())
    }

    async fn create_label(&self, name: &str) -> Result<LabelId, TriageError> {
        let label = self.client.create_label(name).await?;
        info!(name, id = %label.id, "created label");
        Ok(LabelId(label.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorizedUser, TokenStore};
    use crate::types::decode_body_data;
    use chrono::{Duration, Utc};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const USER_PATH: &str = "/gmail/v1/users/me";

    fn token_user(token_uri: String, access: &str) -> AuthorizedUser {
        AuthorizedUser {
            token: access.into(),
            refresh_token: "rt".into(),
            token_uri,
            client_id: "cid".into(),
            client_secret: "cs".into(),
            scopes: vec![],
            expiry: Some(Utc::now() + Duration::hours(1)),
        }
    }

    fn mailbox(server: &MockServer, dir: &tempfile::TempDir) -> GmailMailbox {
        let http = reqwest::Client::new();
        let tokens = TokenStore::new(
            dir.path().join("token.json"),
            http.clone(),
            token_user(format!("{}/token", server.uri()), "good"),
        );
        let client = GmailClient::new(http, &server.uri(), "me", Arc::new(tokens));
        GmailMailbox::with_client(client, 25)
    }

    async fn mount_profile(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/profile")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "emailAddress": "bot@example.com"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn own_address_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/profile")))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "emailAddress": "bot@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mb = mailbox(&server, &dir);
        assert_eq!(mb.own_address().await.unwrap(), "bot@example.com");
        assert_eq!(mb.own_address().await.unwrap(), "bot@example.com");
    }

    #[tokio::test]
    async fn list_candidates_fetches_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/messages")))
            .and(query_param("q", "is:unread -label:\"AI-Replied\""))
            .and(query_param("maxResults", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "m1", "threadId": "t1"}, {"id": "m2", "threadId": "t2"}],
                "resultSizeEstimate": 2
            })))
            .mount(&server)
            .await;
        for (id, subject) in [("m1", "Password"), ("m2", "Refund")] {
            Mock::given(method("GET"))
                .and(path(format!("{USER_PATH}/messages/{id}")))
                .and(query_param("format", "metadata"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": id,
                    "threadId": "ignored",
                    "payload": {"headers": [
                        {"name": "Subject", "value": subject},
                        {"name": "From", "value": "Ann <ann@example.com>"}
                    ]}
                })))
                .mount(&server)
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let summaries = mailbox(&server, &dir)
            .list_candidates("is:unread -label:\"AI-Replied\"")
            .await
            .unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].thread_id, ThreadId("t1".into()));
        assert_eq!(summaries[1].subject, "Refund");
        assert_eq!(summaries[1].from, "Ann <ann@example.com>");
    }

    #[tokio::test]
    async fn candidate_deleted_before_metadata_fetch_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/messages")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "gone", "threadId": "t0"}, {"id": "m2", "threadId": "t2"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/messages/gone")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/messages/m2")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "m2",
                "threadId": "t2",
                "payload": {"headers": [{"name": "Subject", "value": "Refund"}]}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let summaries = mailbox(&server, &dir).list_candidates("is:unread").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, MessageId("m2".into()));
        assert_eq!(summaries[0].subject, "Refund");
    }

    #[tokio::test]
    async fn empty_listing_has_no_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/messages")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"resultSizeEstimate": 0})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let summaries = mailbox(&server, &dir).list_candidates("is:unread").await.unwrap();
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn get_thread_decodes_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/threads/t1")))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t1",
                "messages": [{
                    "id": "m1",
                    "threadId": "t1",
                    "labelIds": ["UNREAD"],
                    "payload": {
                        "mimeType": "text/plain",
                        "headers": [{"name": "From", "value": "ann@example.com"}],
                        "body": {"data": "aGk"}
                    }
                }]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let thread = mailbox(&server, &dir)
            .get_thread(&ThreadId("t1".into()))
            .await
            .unwrap();
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.messages[0].payload.body.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn missing_thread_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/threads/gone")))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = mailbox(&server, &dir)
            .get_thread(&ThreadId("gone".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::NotFound { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn send_builds_raw_mime_with_thread() {
        let server = MockServer::start().await;
        mount_profile(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{USER_PATH}/messages/send")))
            .and(body_partial_json(serde_json::json!({"threadId": "t1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "sent1", "threadId": "t1", "labelIds": ["SENT"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let receipt = mailbox(&server, &dir)
            .send(OutgoingMail {
                to: "ann@example.com".into(),
                subject: "Re: Password".into(),
                body: "Use the reset link.".into(),
                thread_id: Some(ThreadId("t1".into())),
            })
            .await
            .unwrap();
        assert_eq!(receipt.id, MessageId("sent1".into()));

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let send = requests
            .iter()
            .find(|r| r.url.path().ends_with("/messages/send"))
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
        let raw = decode_body_data(body["raw"].as_str().unwrap());
        assert!(raw.contains("To: ann@example.com"), "raw: {raw}");
        assert!(raw.contains("From: bot@example.com"), "raw: {raw}");
        assert!(raw.contains("Subject: Re: Password"), "raw: {raw}");
        assert!(raw.contains("Use the reset link."), "raw: {raw}");
    }

    #[tokio::test]
    async fn send_without_thread_omits_thread_id() {
        let server = MockServer::start().await;
        mount_profile(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{USER_PATH}/messages/send")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "fwd1"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let receipt = mailbox(&server, &dir)
            .send(OutgoingMail {
                to: "support@example.com".into(),
                subject: "Escalated".into(),
                body: "transcript".into(),
                thread_id: None,
            })
            .await
            .unwrap();
        assert!(receipt.thread_id.is_none());

        let requests = server.received_requests().await.unwrap();
        let send = requests
            .iter()
            .find(|r| r.url.path().ends_with("/messages/send"))
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
        assert!(body.get("threadId").is_none());
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_sending() {
        let server = MockServer::start().await;
        mount_profile(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let err = mailbox(&server, &dir)
            .send(OutgoingMail {
                to: "not an address".into(),
                subject: "x".into(),
                body: "y".into(),
                thread_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Mailbox { .. }));
    }

    #[tokio::test]
    async fn modify_sends_one_request_with_both_lists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{USER_PATH}/messages/m1/modify")))
            .and(body_partial_json(serde_json::json!({
                "addLabelIds": ["Label_7"],
                "removeLabelIds": ["UNREAD"]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        mailbox(&server, &dir)
            .modify_labels(
                &MessageId("m1".into()),
                LabelChange {
                    add: vec![LabelId("Label_7".into())],
                    remove: vec![LabelId("UNREAD".into())],
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn labels_are_listed_and_created() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/labels")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "labels": [{"id": "INBOX", "name": "INBOX", "type": "system"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{USER_PATH}/labels")))
            .and(body_partial_json(serde_json::json!({"name": "AI-Ignored"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "Label_9", "name": "AI-Ignored"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mb = mailbox(&server, &dir);
        let labels = mb.list_labels().await.unwrap();
        assert_eq!(labels[0].name, "INBOX");
        assert_eq!(
            mb.create_label("AI-Ignored").await.unwrap(),
            LabelId("Label_9".into())
        );
    }

    #[tokio::test]
    async fn unauthorized_response_refreshes_and_replays() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/profile")))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/profile")))
            .and(header("authorization", "Bearer renewed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "emailAddress": "bot@example.com"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "renewed", "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mb = mailbox(&server, &dir);
        assert_eq!(mb.own_address().await.unwrap(), "bot@example.com");
        assert_eq!(mb.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn failed_refresh_after_401_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/labels")))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = mailbox(&server, &dir).list_labels().await.unwrap_err();
        assert!(matches!(err, TriageError::Auth(_)));
    }

    #[tokio::test]
    async fn server_error_is_transient_mailbox_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{USER_PATH}/messages")))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": 503, "message": "Backend Error", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = mailbox(&server, &dir)
            .list_candidates("is:unread")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("UNAVAILABLE"), "got: {err}");
        assert!(!err.is_fatal());
    }
}
