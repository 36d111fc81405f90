// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the mailtriage agent.

use thiserror::Error;

/// The primary error type used across all mailtriage adapters and core operations.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Configuration errors (invalid file, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Mailbox provider errors (listing, thread lookup, send, label mutation).
    #[error("mailbox error: {message}")]
    Mailbox {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Oracle errors (transport, authentication, quota, malformed output).
    #[error("oracle error: {message}")]
    Oracle {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Mailbox credential failure that could not be repaired by a token refresh.
    ///
    /// Requires an interactive re-authorization before the agent can continue.
    #[error("authentication error: {0}")]
    Auth(String),

    /// A referenced provider object does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TriageError {
    /// Shorthand for a mailbox error without an underlying source.
    pub fn mailbox(message: impl Into<String>) -> Self {
        TriageError::Mailbox {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an oracle error without an underlying source.
    pub fn oracle(message: impl Into<String>) -> Self {
        TriageError::Oracle {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true when the error must stop the worker instead of skipping a message.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TriageError::Auth(_) | TriageError::Config(_) | TriageError::Internal(_)
        )
    }
}
