// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod mailbox;
pub mod oracle;

pub use adapter::PluginAdapter;
pub use mailbox::MailboxAdapter;
pub use oracle::OracleAdapter;
