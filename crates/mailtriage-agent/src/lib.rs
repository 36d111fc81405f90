// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triage pipeline and worker for the mailtriage agent.
//!
//! The [`PollLoop`] is the central coordinator that:
//! - Lists unread messages without a disposition label
//! - Reconstructs each thread and classifies the latest inbound message
//! - Replies, escalates, or ignores according to the intent
//! - Commits the disposition label so the message is never picked again
//!
//! [`WorkerSupervisor`] runs one poll loop in the background and exposes
//! start, stop and status snapshots to the control surface.

pub mod classifier;
pub mod dispatcher;
pub mod ledger;
pub mod poll_loop;
pub mod reconstruct;
pub mod shutdown;
pub mod status;
pub mod supervisor;

pub use classifier::{IntentClassifier, parse_intent};
pub use dispatcher::ActionDispatcher;
pub use ledger::DispositionLedger;
pub use poll_loop::{BatchReport, PollLoop};
pub use reconstruct::{Conversation, ThreadReconstructor};
pub use status::{ActivityEntry, BotStatus, Stats, StatusPublisher, WorkerSnapshot};
pub use supervisor::{AdapterFactory, Adapters, ControlError, WorkerSupervisor};
