// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MiniMedi - terminal host for the health intake engine.
//!
//! This is the binary entry point. It loads configuration, opens durable
//! session storage, and drives a conversation controller from the terminal.

mod history;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use minimedi_api::ApiClient;
use minimedi_config::MinimediConfig;
use minimedi_core::MinimediError;
use minimedi_intake::ConversationController;
use minimedi_storage::SqlitePersistence;
use tracing::debug;

/// MiniMedi - AI health intake assistant.
#[derive(Parser, Debug)]
#[command(name = "minimedi", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Continue (or start) the intake conversation. This is the default.
    Chat,
    /// Finalise the current session's record and start over.
    Reset,
    /// Print the persisted transcript.
    Transcript,
    /// List saved health records, newest first.
    History,
    /// Delete one saved record by id.
    Delete {
        /// Record id as shown by `minimedi history`.
        id: String,
    },
    /// Delete every saved record.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => minimedi_config::load_and_validate_path(path),
        None => minimedi_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            minimedi_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let result = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => shell::run_chat(&config).await,
        Commands::Reset => run_reset(&config).await,
        Commands::Transcript => run_transcript(&config).await,
        Commands::History => history::run_history(&config).await,
        Commands::Delete { id } => history::run_delete(&config, &id).await,
        Commands::Clear { yes } => history::run_clear(&config, yes).await,
    };

    if let Err(e) = result {
        eprintln!("minimedi: {e}");
        std::process::exit(1);
    }
}

/// Opens the persisted session and wires it to the configured backend.
pub(crate) fn open_session(config: &MinimediConfig) -> Result<ConversationController, MinimediError> {
    let persistence = Arc::new(SqlitePersistence::open(&config.storage)?);
    let client = Arc::new(ApiClient::new(&config.api)?);
    debug!(base_url = client.base_url(), "api client ready");
    Ok(ConversationController::from_config(
        config,
        persistence,
        client.clone(),
        client,
    ))
}

async fn run_reset(config: &MinimediConfig) -> Result<(), MinimediError> {
    let controller = open_session(config)?;
    let outcome = controller.reset().await;
    println!("session reset ({outcome:?})");
    Ok(())
}

async fn run_transcript(config: &MinimediConfig) -> Result<(), MinimediError> {
    let controller = open_session(config)?;
    for turn in controller.transcript().await {
        shell::print_turn(&turn);
    }
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("minimedi={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
