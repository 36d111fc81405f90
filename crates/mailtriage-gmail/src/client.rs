// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gmail REST API (`gmail/v1/users/{userId}/...`).

use std::sync::Arc;

use mailtriage_core::TriageError;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::types::{
    ApiErrorResponse, CreateLabelRequest, GmailLabel, GmailMessage, GmailThread, LabelList,
    MessageList, ModifyRequest, Profile, SendRequest, SendResponse,
};

/// Authenticated Gmail API client.
///
/// A 401 triggers one forced token refresh and a single replay of the
/// request; a second 401 is an authentication failure.
#[derive(Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, api_base: &str, user_id: &str, tokens: Arc<TokenStore>) -> Self {
        Self {
            http,
            base_url: format!("{}/gmail/v1/users/{user_id}", api_base.trim_end_matches('/')),
            tokens,
        }
    }

    pub async fn profile(&self) -> Result<Profile, TriageError> {
        self.call(Method::GET, "/profile", |r| r).await
    }

    /// Lists message ids matching `query`, first page only.
    pub async fn list_messages(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<MessageList, TriageError> {
        let max = max_results.to_string();
        self.call(Method::GET, "/messages", |r| {
            r.query(&[("q", query), ("maxResults", max.as_str())])
        })
        .await
    }

    /// Fetches a message with only the `Subject` and `From` headers.
    pub async fn message_metadata(&self, id: &str) -> Result<GmailMessage, TriageError> {
        self.call(Method::GET, &format!("/messages/{id}"), |r| {
            r.query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
            ])
        })
        .await
    }

    pub async fn thread(&self, id: &str) -> Result<GmailThread, TriageError> {
        self.call(Method::GET, &format!("/threads/{id}"), |r| {
            r.query(&[("format", "full")])
        })
        .await
    }

    pub async fn send(&self, request: &SendRequest) -> Result<SendResponse, TriageError> {
        self.call(Method::POST, "/messages/send", |r| r.json(request))
            .await
    }

    pub async fn modify(&self, id: &str, request: &ModifyRequest) -> Result<(), TriageError> {
        let _: serde_json::Value = self
            .call(Method::POST, &format!("/messages/{id}/modify"), |r| {
                r.json(request)
            })
            .await?;
        Ok(())
    }

    pub async fn labels(&self) -> Result<LabelList, TriageError> {
        self.call(Method::GET, "/labels", |r| r).await
    }

    pub async fn create_label(&self, name: &str) -> Result<GmailLabel, TriageError> {
        let request = CreateLabelRequest {
            name: name.to_string(),
            label_list_visibility: "labelShow",
            message_list_visibility: "show",
        };
        self.call(Method::POST, "/labels", |r| r.json(&request)).await
    }

    async fn call<T, F>(&self, method: Method, path: &str, build: F) -> Result<T, TriageError>
    where
        T: DeserializeOwned,
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = format!("{}{path}", self.base_url);

        let token = self.tokens.access_token().await?;
        let mut response = self.send_once(&method, &url, &token, &build).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path, "access token rejected, refreshing");
            let token = self.tokens.force_refresh().await?;
            response = self.send_once(&method, &url, &token, &build).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(TriageError::Auth(
                    "Gmail rejected a freshly refreshed token".into(),
                ));
            }
        }

        let status = response.status();
        debug!(%method, path, status = %status, "gmail response");

        let body = response.text().await.map_err(|e| TriageError::Mailbox {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(TriageError::NotFound {
                kind: "gmail resource".into(),
                id: path.trim_start_matches('/').to_string(),
            });
        }

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gmail API error {} ({}): {}",
                    api_err.error.code,
                    api_err.error.status.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("Gmail API returned {status}: {body}"),
            };
            return Err(TriageError::mailbox(message));
        }

        // Empty bodies (e.g. modify) parse as JSON null.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| TriageError::Mailbox {
            message: format!("failed to parse Gmail response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn send_once<F>(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        build: &F,
    ) -> Result<reqwest::Response, TriageError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        build(self.http.request(method.clone(), url).bearer_auth(token))
            .send()
            .await
            .map_err(|e| TriageError::Mailbox {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })
    }
}
