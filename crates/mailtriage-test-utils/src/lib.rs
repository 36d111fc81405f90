// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for mailtriage integration tests.
//!
//! Provides mock adapters and fixtures for fast, deterministic tests
//! without a real mailbox or oracle.
//!
//! # Components
//!
//! - [`MockMailbox`] - In-memory mailbox with query evaluation and send capture
//! - [`MockOracle`] - Scripted oracle with request capture

pub mod fixtures;
pub mod mock_mailbox;
pub mod mock_oracle;

pub use fixtures::{inbound_message, sent_message, test_config, with_alternative};
pub use mock_mailbox::{Failure, MockMailbox};
pub use mock_oracle::MockOracle;
