// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! mailtriage - An autonomous email triage agent.
//!
//! This is the binary entry point.

mod auth;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mailtriage_core::TriageError;

/// mailtriage - Reads unread Gmail, replies, escalates or ignores.
#[derive(Parser, Debug)]
#[command(name = "mailtriage", version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON or TOML). Defaults to ./config.json,
    /// ./mailtriage.toml, then the user config directory.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the control API; the worker starts on request.
    Serve {
        /// Start the worker immediately.
        #[arg(long)]
        autostart: bool,
    },
    /// Run the worker in the foreground until interrupted.
    Run,
    /// Process one batch of unread messages and exit.
    Once,
    /// Resolve the disposition labels, creating missing ones, and print them.
    Labels,
    /// Authorize Gmail access interactively and store the token.
    Auth,
    /// Validate the configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match mailtriage_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            mailtriage_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve { autostart }) => serve::run_serve(config, autostart).await,
        Some(Commands::Run) => serve::run_foreground(config).await,
        Some(Commands::Once) => serve::run_once(config).await,
        Some(Commands::Labels) => serve::run_labels(config).await,
        Some(Commands::Auth) => auth::run_auth(&config).await,
        Some(Commands::CheckConfig) => {
            println!(
                "mailtriage: config OK (model={}, interval={}s, support={})",
                config.settings.openai_model,
                config.settings.polling_interval_seconds,
                config.settings.support_email
            );
            Ok(())
        }
        None => {
            println!("mailtriage: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        if matches!(e, TriageError::Auth(_)) {
            eprintln!("hint: run `mailtriage auth` to authorize Gmail access again");
        }
        std::process::exit(1);
    }
}
