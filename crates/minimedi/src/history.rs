// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `minimedi history`, `minimedi delete`, and `minimedi clear` command implementations.

use colored::Colorize;
use minimedi_config::MinimediConfig;
use minimedi_core::{MinimediError, RecordId, SessionRecord};
use rustyline::DefaultEditor;

use crate::open_session;

/// One-line summary of a saved record.
pub fn format_record(record: &SessionRecord) -> String {
    let name = record.patient_name.as_deref().unwrap_or("Guest");
    let severity = record
        .severity
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!("#{:<6} {name:<20} {severity:<6}", record.id.as_str());
    if let Some(risk) = record.risk_score {
        line.push_str(&format!(" risk {risk:>3}"));
    }
    if let Some(days) = record.duration {
        line.push_str(&format!(" {days} day(s)"));
    }
    if let Some(created) = record.created_at {
        line.push_str(&format!("  {}", created.format("%Y-%m-%d %H:%M")));
    }
    line
}

pub async fn run_history(config: &MinimediConfig) -> Result<(), MinimediError> {
    let controller = open_session(config)?;
    let records = controller.history().await?;
    if records.is_empty() {
        println!("{}", "no saved records".dimmed());
        return Ok(());
    }

    let current = controller.cached_record_id().await;
    for record in &records {
        let line = format_record(record);
        if current.as_ref() == Some(&record.id) {
            println!("{} {}", line, "(this session)".green());
        } else {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_delete(config: &MinimediConfig, id: &str) -> Result<(), MinimediError> {
    let controller = open_session(config)?;
    controller.delete_record(&RecordId::from(id)).await?;
    println!("record {id} deleted");
    Ok(())
}

pub async fn run_clear(config: &MinimediConfig, yes: bool) -> Result<(), MinimediError> {
    if !yes && !confirm("Delete your entire health check history? This cannot be undone. [y/N] ")? {
        println!("{}", "nothing deleted".dimmed());
        return Ok(());
    }

    let controller = open_session(config)?;
    let removed = controller.clear_records().await?;
    println!("{removed} record(s) deleted");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, MinimediError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| MinimediError::Internal(format!("failed to initialize readline: {e}")))?;
    match rl.readline(prompt) {
        Ok(answer) => Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")),
        Err(_) => Ok(false),
    }
}
