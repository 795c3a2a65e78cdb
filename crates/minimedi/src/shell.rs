// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `minimedi chat` command implementation.
//!
//! Restores the persisted session, prints it, then reads lines with
//! readline history and feeds them to the conversation controller.
//! Messages are printed as plain text with a colored role label.

use colored::Colorize;
use minimedi_config::MinimediConfig;
use minimedi_core::{MinimediError, Role, Turn};
use minimedi_intake::TurnOutcome;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::open_session;

/// Prints one turn with its role label.
pub fn print_turn(turn: &Turn) {
    let label = match turn.role {
        Role::Assistant => "minimedi".green().bold(),
        Role::User => "you".cyan().bold(),
    };
    println!("{label}: {}\n", turn.content);
}

/// Runs the interactive intake REPL.
pub async fn run_chat(config: &MinimediConfig) -> Result<(), MinimediError> {
    let controller = open_session(config)?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| MinimediError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "minimedi".bold().green());
    println!(
        "Type {} to start over, {} to exit.\n",
        "/reset".yellow(),
        "/quit".yellow()
    );
    for turn in controller.transcript().await {
        print_turn(&turn);
    }

    let prompt = format!("{}> ", "you".cyan());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed == "/reset" {
                    let outcome = controller.reset().await;
                    debug!(?outcome, "reset from shell");
                    println!("{}\n", "session cleared".dimmed());
                    for turn in controller.transcript().await {
                        print_turn(&turn);
                    }
                    continue;
                }

                match controller.submit(trimmed).await {
                    Ok(TurnOutcome::Replied { reply, .. }) | Ok(TurnOutcome::Fallback { reply }) => {
                        print_turn(&Turn::assistant(reply));
                    }
                    Ok(TurnOutcome::Discarded) => {}
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    // Let in-flight record writes land before the process exits.
    controller.flush().await;
    println!("{}", "goodbye".dimmed());
    Ok(())
}
