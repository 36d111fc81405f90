// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google OAuth for the Gmail adapter.
//!
//! The token file uses Google's authorized-user layout (`token`,
//! `refresh_token`, `token_uri`, `client_id`, `client_secret`, `scopes`,
//! `expiry`) so existing `token.json` files keep working. Access tokens are
//! refreshed on expiry or after a 401. A rejected refresh deletes the token
//! file and surfaces [`TriageError::Auth`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use mailtriage_core::TriageError;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Scope needed to read, send and relabel mail.
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth client secrets as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parses a `credentials.json` document (`installed` or `web` client).
    pub fn from_json(content: &str) -> Result<Self, TriageError> {
        let file: ClientSecretsFile = serde_json::from_str(content)
            .map_err(|e| TriageError::Config(format!("invalid client secrets: {e}")))?;
        file.installed.or(file.web).ok_or_else(|| {
            TriageError::Config("client secrets contain neither `installed` nor `web`".into())
        })
    }

    pub async fn load(path: &Path) -> Result<Self, TriageError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TriageError::Config(format!(
                "cannot read client secrets `{}`: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Redirect URI used for the installed-app flow.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost")
    }
}

/// Persisted user credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    /// Current access token.
    #[serde(default)]
    pub token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl AuthorizedUser {
    /// True when the access token is missing or about to expire.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_empty() {
            return true;
        }
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }

    pub async fn load(path: &Path) -> Result<Self, TriageError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TriageError::Auth(format!(
                    "no token at `{}`; run `mailtriage auth` first",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(TriageError::Auth(format!(
                    "cannot read token `{}`: {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            TriageError::Auth(format!("invalid token file `{}`: {e}", path.display()))
        })
    }

    pub async fn save(&self, path: &Path) -> Result<(), TriageError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TriageError::Internal(format!("cannot serialize token: {e}")))?;
        tokio::fs::write(path, json).await.map_err(|e| {
            TriageError::Auth(format!("cannot write token `{}`: {e}", path.display()))
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Holds the current credentials and refreshes them on demand.
pub struct TokenStore {
    path: PathBuf,
    http: reqwest::Client,
    user: Mutex<AuthorizedUser>,
}

impl TokenStore {
    /// Loads the token file at `path`.
    pub async fn open(path: impl Into<PathBuf>, http: reqwest::Client) -> Result<Self, TriageError> {
        let path = path.into();
        let user = AuthorizedUser::load(&path).await?;
        Ok(Self::new(path, http, user))
    }

    pub fn new(path: PathBuf, http: reqwest::Client, user: AuthorizedUser) -> Self {
        Self {
            path,
            http,
            user: Mutex::new(user),
        }
    }

    /// Returns a usable access token, refreshing it first when expired.
    pub async fn access_token(&self) -> Result<String, TriageError> {
        let mut user = self.user.lock().await;
        if user.needs_refresh(Utc::now()) {
            self.refresh_locked(&mut user).await?;
        }
        Ok(user.token.clone())
    }

    /// Refreshes unconditionally, e.g. after the API rejected the token.
    pub async fn force_refresh(&self) -> Result<String, TriageError> {
        let mut user = self.user.lock().await;
        self.refresh_locked(&mut user).await?;
        Ok(user.token.clone())
    }

    async fn refresh_locked(&self, user: &mut AuthorizedUser) -> Result<(), TriageError> {
        debug!("refreshing Gmail access token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", user.refresh_token.as_str()),
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&user.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| TriageError::Mailbox {
                message: format!("token refresh request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "token refresh rejected, discarding stored token");
            self.discard().await;
            return Err(TriageError::Auth(format!(
                "token refresh rejected ({status}): {body}; run `mailtriage auth` to re-authorize"
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| TriageError::Mailbox {
            message: format!("invalid token refresh response: {e}"),
            source: Some(Box::new(e)),
        })?;

        user.token = token.access_token;
        if let Some(refresh) = token.refresh_token {
            user.refresh_token = refresh;
        }
        user.expiry = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        if let Err(e) = user.save(&self.path).await {
            warn!(error = %e, "refreshed token could not be persisted");
        }
        info!("Gmail access token refreshed");
        Ok(())
    }

    async fn discard(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => info!(path = %self.path.display(), "deleted stored token"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "could not delete stored token"),
        }
    }
}

/// Builds the consent URL for the installed-app flow.
pub fn authorization_url(secrets: &ClientSecrets, state: &str) -> Result<String, TriageError> {
    let mut url = reqwest::Url::parse(&secrets.auth_uri)
        .map_err(|e| TriageError::Config(format!("invalid auth_uri: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", secrets.redirect_uri())
        .append_pair("response_type", "code")
        .append_pair("scope", GMAIL_MODIFY_SCOPE)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("state", state);
    Ok(url.to_string())
}

/// Accepts either a bare authorization code or the full redirected URL.
///
/// When a URL carries a `state` parameter it must equal `expected_state`.
pub fn extract_code(input: &str, expected_state: &str) -> Result<String, TriageError> {
    let input = input.trim();
    if !input.contains("code=") {
        if input.is_empty() {
            return Err(TriageError::Auth("no authorization code entered".into()));
        }
        return Ok(input.to_string());
    }

    let url = reqwest::Url::parse(input)
        .map_err(|e| TriageError::Auth(format!("cannot parse redirect URL: {e}")))?;
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(state) = state
        && state != expected_state
    {
        return Err(TriageError::Auth("authorization state mismatch".into()));
    }
    code.ok_or_else(|| TriageError::Auth("redirect URL has no code".into()))
}

/// Exchanges an authorization code for user credentials.
pub async fn exchange_code(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    code: &str,
) -> Result<AuthorizedUser, TriageError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", secrets.redirect_uri()),
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
    ];

    let response = http
        .post(&secrets.token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|e| TriageError::Auth(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TriageError::Auth(format!(
            "token exchange rejected ({status}): {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| TriageError::Auth(format!("invalid token exchange response: {e}")))?;

    let refresh_token = token.refresh_token.ok_or_else(|| {
        TriageError::Auth("token exchange returned no refresh token".into())
    })?;

    Ok(AuthorizedUser {
        token: token.access_token,
        refresh_token,
        token_uri: secrets.token_uri.clone(),
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        scopes: vec![GMAIL_MODIFY_SCOPE.to_string()],
        expiry: token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}

/// Random anti-forgery value for the consent round trip.
pub fn new_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
