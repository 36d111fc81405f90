// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker-facing subcommands: `serve`, `run`, `once` and `labels`.

use std::sync::Arc;

use async_trait::async_trait;
use mailtriage_agent::shutdown;
use mailtriage_agent::{
    AdapterFactory, Adapters, DispositionLedger, PollLoop, StatusPublisher, WorkerSupervisor,
};
use mailtriage_config::TriageConfig;
use mailtriage_config::model::{GmailConfig, OpenAiConfig};
use mailtriage_core::TriageError;
use mailtriage_core::types::{Disposition, HealthStatus};
use mailtriage_core::traits::PluginAdapter;
use mailtriage_gateway::{GatewayState, start_server};
use mailtriage_gmail::GmailMailbox;
use mailtriage_openai::OpenAiOracle;
use tracing::{info, warn};

/// Connects the Gmail mailbox and the OpenAI oracle.
struct GmailOpenAiFactory {
    gmail: GmailConfig,
    openai: OpenAiConfig,
}

impl GmailOpenAiFactory {
    fn new(config: &TriageConfig) -> Self {
        Self {
            gmail: config.gmail.clone(),
            openai: config.openai.clone(),
        }
    }
}

#[async_trait]
impl AdapterFactory for GmailOpenAiFactory {
    async fn connect(&self) -> Result<Adapters, TriageError> {
        let mailbox = GmailMailbox::connect(&self.gmail).await?;
        match mailbox.health_check().await? {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => warn!(%reason, "mailbox degraded"),
            HealthStatus::Unhealthy(reason) => {
                return Err(TriageError::mailbox(format!("mailbox unavailable: {reason}")));
            }
        }
        let oracle = OpenAiOracle::new(&self.openai)?;
        Ok(Adapters {
            mailbox: Arc::new(mailbox),
            oracle: Arc::new(oracle),
        })
    }
}

/// Serves the control API, optionally starting the worker right away.
///
/// Returns after SIGINT/SIGTERM once the worker has finished its batch.
pub async fn run_serve(config: TriageConfig, autostart: bool) -> Result<(), TriageError> {
    init_tracing(&config.agent.log_level);
    info!(version = %config.bot_version, "starting mailtriage serve");

    let config = Arc::new(config);
    let cancel = shutdown::install_signal_handler();
    let factory = Arc::new(GmailOpenAiFactory::new(&config));
    let supervisor = Arc::new(WorkerSupervisor::new(
        config.clone(),
        factory,
        cancel.clone(),
    ));

    if autostart {
        supervisor
            .start()
            .await
            .map_err(|e| TriageError::Internal(e.to_string()))?;
    }

    let result = if config.gateway.enabled {
        let state = GatewayState::new(supervisor.clone(), config.bot_version.clone());
        start_server(&config.gateway, state, cancel.clone()).await
    } else {
        info!("control API disabled; waiting for shutdown signal");
        cancel.cancelled().await;
        Ok(())
    };

    supervisor.shutdown().await;
    info!("mailtriage stopped");
    result
}

/// Runs the worker in the foreground until a signal arrives.
pub async fn run_foreground(config: TriageConfig) -> Result<(), TriageError> {
    init_tracing(&config.agent.log_level);

    let adapters = GmailOpenAiFactory::new(&config).connect().await?;
    let status = StatusPublisher::new(config.gateway.activity_log_limit);
    let worker = PollLoop::build(adapters.mailbox, adapters.oracle, &config, status).await?;

    let cancel = shutdown::install_signal_handler();
    worker.run(cancel).await
}

/// Processes one batch and prints a summary.
pub async fn run_once(config: TriageConfig) -> Result<(), TriageError> {
    init_tracing(&config.agent.log_level);

    let adapters = GmailOpenAiFactory::new(&config).connect().await?;
    let status = StatusPublisher::new(config.gateway.activity_log_limit);
    let worker = PollLoop::build(adapters.mailbox, adapters.oracle, &config, status).await?;

    let report = worker.run_batch().await?;
    println!(
        "candidates: {}  handled: {}  skipped: {}  failed: {}",
        report.candidates,
        report.handled.len(),
        report.skipped,
        report.failed
    );
    for (id, disposition) in &report.handled {
        println!("  {id}  {disposition}");
    }
    Ok(())
}

/// Resolves the disposition labels and prints their ids.
pub async fn run_labels(config: TriageConfig) -> Result<(), TriageError> {
    init_tracing(&config.agent.log_level);

    let mailbox = Arc::new(GmailMailbox::connect(&config.gmail).await?);
    let ledger =
        DispositionLedger::resolve(mailbox, &config.labels, config.gmail.inbox_only).await?;

    for disposition in Disposition::ALL {
        let id = ledger
            .label_id(disposition)
            .map(ToString::to_string)
            .unwrap_or_default();
        println!(
            "{:<10} {:<20} {}",
            disposition.to_string(),
            config.labels.name_for(disposition),
            id
        );
    }
    println!("query: {}", ledger.exclusion_filter());
    Ok(())
}

/// Initialize the tracing subscriber with the configured log level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mailtriage={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
