// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Start/stop control over a single background worker.

use std::sync::Arc;

use async_trait::async_trait;
use mailtriage_config::TriageConfig;
use mailtriage_core::traits::{MailboxAdapter, OracleAdapter};
use mailtriage_core::TriageError;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::poll_loop::PollLoop;
use crate::status::{BotStatus, StatusPublisher, WorkerSnapshot};

/// Connected adapters for one worker run.
pub struct Adapters {
    pub mailbox: Arc<dyn MailboxAdapter>,
    pub oracle: Arc<dyn OracleAdapter>,
}

/// Builds fresh adapters each time the worker starts.
#[async_trait]
pub trait AdapterFactory: Send + Sync + 'static {
    async fn connect(&self) -> Result<Adapters, TriageError>;
}

/// Rejected control requests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    #[error("Bot is already running.")]
    AlreadyRunning,
    #[error("Bot is not running.")]
    NotRunning,
}

struct RunningWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the worker task. At most one worker runs at a time.
pub struct WorkerSupervisor {
    config: Arc<TriageConfig>,
    factory: Arc<dyn AdapterFactory>,
    status: StatusPublisher,
    shutdown: CancellationToken,
    worker: Mutex<Option<RunningWorker>>,
}

impl WorkerSupervisor {
    /// Creates a supervisor. Cancelling `shutdown` stops any running worker.
    pub fn new(
        config: Arc<TriageConfig>,
        factory: Arc<dyn AdapterFactory>,
        shutdown: CancellationToken,
    ) -> Self {
        let status = StatusPublisher::new(config.gateway.activity_log_limit);
        Self {
            config,
            factory,
            status,
            shutdown,
            worker: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        self.status.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerSnapshot> {
        self.status.subscribe()
    }

    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Spawns the worker unless one is already running.
    pub async fn start(&self) -> Result<(), ControlError> {
        let mut slot = self.worker.lock().await;
        if slot.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return Err(ControlError::AlreadyRunning);
        }

        self.status.set_status(BotStatus::Starting);
        let cancel = self.shutdown.child_token();
        let task = tokio::spawn(run_worker(
            self.factory.clone(),
            self.config.clone(),
            self.status.clone(),
            cancel.clone(),
        ));

        let status = self.status.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = task.await {
                error!(error = %e, "worker task aborted");
                status.fail(format!("worker task aborted: {e}"));
            }
        });

        *slot = Some(RunningWorker { cancel, handle });
        info!("worker started");
        Ok(())
    }

    /// Requests a stop and waits for the current batch to finish.
    pub async fn stop(&self) -> Result<(), ControlError> {
        let mut slot = self.worker.lock().await;
        let worker = match slot.take() {
            Some(w) if !w.handle.is_finished() => w,
            _ => return Err(ControlError::NotRunning),
        };

        worker.cancel.cancel();
        if let Err(e) = worker.handle.await {
            warn!(error = %e, "worker did not shut down cleanly");
        }
        info!("worker stopped");
        Ok(())
    }

    /// Stops the worker if one is running.
    pub async fn shutdown(&self) {
        if self.stop().await.is_ok() {
            info!("worker shut down");
        }
    }
}

async fn run_worker(
    factory: Arc<dyn AdapterFactory>,
    config: Arc<TriageConfig>,
    status: StatusPublisher,
    cancel: CancellationToken,
) {
    let adapters = match factory.connect().await {
        Ok(adapters) => adapters,
        Err(e) => {
            error!(error = %e, "failed to connect adapters");
            status.fail(e.to_string());
            return;
        }
    };

    let worker = match PollLoop::build(
        adapters.mailbox.clone(),
        adapters.oracle.clone(),
        &config,
        status.clone(),
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!(error = %e, "failed to prepare poll loop");
            status.fail(e.to_string());
            return;
        }
    };

    // `run` publishes its own terminal status.
    let _ = worker.run(cancel).await;

    if let Err(e) = adapters.mailbox.shutdown().await {
        warn!(error = %e, "mailbox shutdown failed");
    }
    if let Err(e) = adapters.oracle.shutdown().await {
        warn!(error = %e, "oracle shutdown failed");
    }
}
