// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker status, counters and activity log.
//!
//! The worker is the only writer. Readers receive immutable
//! [`WorkerSnapshot`] values through a `watch` channel.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Local;
use mailtriage_core::types::{Disposition, Intent};
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;

/// Lifecycle state of the worker as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum BotStatus {
    Offline,
    #[serde(rename = "Starting...")]
    #[strum(serialize = "Starting...")]
    Starting,
    Running,
    Error,
}

/// Running totals since the process started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub processed: u64,
    pub replied: u64,
    pub escalated: u64,
    pub ignored: u64,
}

impl Stats {
    fn record(&mut self, disposition: Disposition) {
        self.processed += 1;
        match disposition {
            Disposition::Replied => self.replied += 1,
            Disposition::Escalated => self.escalated += 1,
            Disposition::Ignored => self.ignored += 1,
        }
    }
}

/// One handled message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub id: String,
    pub from: String,
    pub intent: String,
    pub action: String,
    pub time: String,
}

impl ActivityEntry {
    pub fn new(from: &str, intent: Intent, disposition: Disposition) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            from: from.to_string(),
            intent: intent.to_string(),
            action: disposition.to_string(),
            time: Local::now().format("%H:%M:%S").to_string(),
        }
    }

    /// Placeholder row shown while the worker is idle and nothing has run.
    pub fn ready() -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            from: "System".to_string(),
            intent: "Status".to_string(),
            action: "Ready".to_string(),
            time: Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

/// Point-in-time view of the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSnapshot {
    pub bot_status: BotStatus,
    pub stats: Stats,
    /// Newest first.
    pub activity_log: VecDeque<ActivityEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Default for WorkerSnapshot {
    fn default() -> Self {
        Self {
            bot_status: BotStatus::Offline,
            stats: Stats::default(),
            activity_log: VecDeque::new(),
            last_error: None,
        }
    }
}

impl WorkerSnapshot {
    /// The snapshot as presented to dashboard clients.
    pub fn for_dashboard(&self) -> WorkerSnapshot {
        let mut view = self.clone();
        if view.bot_status == BotStatus::Offline && view.activity_log.is_empty() {
            view.activity_log.push_back(ActivityEntry::ready());
        }
        view
    }
}

/// Write side of the status channel.
#[derive(Clone)]
pub struct StatusPublisher {
    tx: Arc<watch::Sender<WorkerSnapshot>>,
    limit: usize,
}

impl StatusPublisher {
    /// Creates a publisher keeping at most `limit` activity entries.
    pub fn new(limit: usize) -> Self {
        let (tx, _rx) = watch::channel(WorkerSnapshot::default());
        Self {
            tx: Arc::new(tx),
            limit: limit.max(1),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        self.tx.borrow().clone()
    }

    pub fn set_status(&self, status: BotStatus) {
        self.tx.send_modify(|s| {
            s.bot_status = status;
            if status != BotStatus::Error {
                s.last_error = None;
            }
        });
    }

    /// Moves to `Error`, keeping the cause for the dashboard.
    pub fn fail(&self, error: impl Into<String>) {
        let error = error.into();
        self.tx.send_modify(|s| {
            s.bot_status = BotStatus::Error;
            s.last_error = Some(error);
        });
    }

    /// Counts a handled message and prepends it to the activity log.
    pub fn record(&self, from: &str, intent: Intent, disposition: Disposition) {
        let entry = ActivityEntry::new(from, intent, disposition);
        let limit = self.limit;
        self.tx.send_modify(|s| {
            s.stats.record(disposition);
            s.activity_log.push_front(entry);
            s.activity_log.truncate(limit);
        });
    }
}
