// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The polling worker.
//!
//! Each cycle lists unhandled unread messages and runs every candidate
//! through reconstruction, classification, dispatch and label commit, one
//! message at a time. Provider failures are logged and retried next cycle;
//! a credential failure ends the loop.

use std::sync::Arc;
use std::time::Duration;

use mailtriage_config::TriageConfig;
use mailtriage_core::traits::{MailboxAdapter, OracleAdapter};
use mailtriage_core::types::{Disposition, MessageId, MessageSummary};
use mailtriage_core::TriageError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classifier::IntentClassifier;
use crate::dispatcher::ActionDispatcher;
use crate::ledger::DispositionLedger;
use crate::reconstruct::ThreadReconstructor;
use crate::status::{BotStatus, StatusPublisher};

/// Outcome of one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub candidates: usize,
    pub handled: Vec<(MessageId, Disposition)>,
    pub skipped: usize,
    pub failed: usize,
}

/// The triage worker.
pub struct PollLoop {
    mailbox: Arc<dyn MailboxAdapter>,
    reconstructor: ThreadReconstructor,
    classifier: IntentClassifier,
    dispatcher: ActionDispatcher,
    ledger: DispositionLedger,
    interval: Duration,
    status: StatusPublisher,
}

impl PollLoop {
    /// Resolves the account address and disposition labels, then wires the
    /// pipeline together.
    pub async fn build(
        mailbox: Arc<dyn MailboxAdapter>,
        oracle: Arc<dyn OracleAdapter>,
        config: &TriageConfig,
        status: StatusPublisher,
    ) -> Result<Self, TriageError> {
        let own_address = mailbox.own_address().await?;
        let ledger =
            DispositionLedger::resolve(mailbox.clone(), &config.labels, config.gmail.inbox_only)
                .await?;
        info!(account = %own_address, "poll loop ready");

        Ok(Self {
            reconstructor: ThreadReconstructor::new(mailbox.clone(), own_address),
            classifier: IntentClassifier::new(oracle.clone(), config),
            dispatcher: ActionDispatcher::new(mailbox.clone(), oracle, config),
            mailbox,
            ledger,
            interval: Duration::from_secs(config.settings.polling_interval_seconds),
            status,
        })
    }

    pub fn ledger(&self) -> &DispositionLedger {
        &self.ledger
    }

    /// Runs batches until `cancel` fires or a fatal error occurs.
    ///
    /// Cancellation is observed between batches and during the sleep, never
    /// in the middle of a batch.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), TriageError> {
        self.status.set_status(BotStatus::Running);
        info!(interval_secs = self.interval.as_secs(), "poll loop started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if let Err(e) = self.run_batch().await {
                error!(error = %e, "poll loop stopped");
                self.status.fail(e.to_string());
                return Err(e);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("stop requested during sleep");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("poll loop stopped");
        self.status.set_status(BotStatus::Offline);
        Ok(())
    }

    /// Lists candidates and processes each in order.
    pub async fn run_batch(&self) -> Result<BatchReport, TriageError> {
        let query = self.ledger.exclusion_filter();
        let candidates = match self.mailbox.list_candidates(&query).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "failed to list candidates, will retry next cycle");
                Vec::new()
            }
        };
        let mut report = BatchReport {
            candidates: candidates.len(),
            ..BatchReport::default()
        };

        if candidates.is_empty() {
            debug!("no new messages");
            return Ok(report);
        }
        info!(count = candidates.len(), "found new messages");

        for summary in &candidates {
            match self.process_message(summary).await {
                Ok(Some(disposition)) => report.handled.push((summary.id.clone(), disposition)),
                Ok(None) => report.skipped += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(message_id = %summary.id, error = %e, "message failed, will retry next cycle");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Handles one candidate. `Ok(None)` means it was skipped.
    pub async fn process_message(
        &self,
        summary: &MessageSummary,
    ) -> Result<Option<Disposition>, TriageError> {
        debug!(message_id = %summary.id, from = %summary.from, subject = %summary.subject, "processing");

        let conversation = self.reconstructor.reconstruct(&summary.thread_id).await?;
        let Some(latest) = conversation.latest_sender_content() else {
            warn!(message_id = %summary.id, "no conversation content, skipping");
            return Ok(None);
        };

        let intent = self.classifier.classify(latest).await;
        let disposition = self
            .dispatcher
            .dispatch(intent, summary, &conversation)
            .await?;

        if let Err(e) = self.ledger.commit(&summary.id, disposition).await {
            warn!(
                message_id = %summary.id,
                disposition = %disposition,
                error = %e,
                "label commit failed after actions ran; message may be handled again"
            );
            return Err(e);
        }

        self.status.record(&summary.from, intent, disposition);
        info!(
            message_id = %summary.id,
            intent = %intent,
            disposition = %disposition,
            "message handled"
        );
        Ok(Some(disposition))
    }
}
