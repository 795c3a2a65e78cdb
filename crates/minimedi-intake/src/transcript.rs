// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable, ordered log of conversational turns.

use std::sync::Arc;

use minimedi_core::{MinimediError, PersistencePort, Turn};
use tracing::{debug, warn};

/// The session transcript, persisted in full under one key after every mutation.
///
/// The in-memory copy is authoritative for the running process. A failed
/// save is returned to the caller but the mutation is kept, so the
/// conversation carries on and the next successful save catches up.
pub struct TranscriptStore {
    port: Arc<dyn PersistencePort>,
    key: String,
    greeting: String,
    turns: Vec<Turn>,
}

impl std::fmt::Debug for TranscriptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptStore")
            .field("key", &self.key)
            .field("turns", &self.turns.len())
            .finish_non_exhaustive()
    }
}

impl TranscriptStore {
    /// Restores the transcript stored under `key`, or seeds a fresh one with
    /// the greeting when nothing usable is stored.
    ///
    /// Unreadable storage and undecodable or empty contents all count as
    /// absent; this never fails.
    pub fn open(
        port: Arc<dyn PersistencePort>,
        key: impl Into<String>,
        greeting: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let greeting = greeting.into();

        let restored = match port.load(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Turn>>(&raw) {
                Ok(turns) if !turns.is_empty() => Some(turns),
                Ok(_) => None,
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "stored transcript is corrupt, starting fresh");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "failed to load transcript, starting fresh");
                None
            }
        };

        let turns = match restored {
            Some(turns) => {
                debug!(key = key.as_str(), turns = turns.len(), "transcript restored");
                turns
            }
            None => vec![Turn::assistant(greeting.clone())],
        };

        Self {
            port,
            key,
            greeting,
            turns,
        }
    }

    /// Appends a turn and persists the whole transcript.
    pub fn append(&mut self, turn: Turn) -> Result<(), MinimediError> {
        self.turns.push(turn);
        self.persist()
    }

    /// All turns in chronological order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Drops every turn and persists the reseeded greeting over the stored entry.
    pub fn reset(&mut self) -> Result<(), MinimediError> {
        self.turns = vec![Turn::assistant(self.greeting.clone())];
        self.persist()
    }

    fn persist(&self) -> Result<(), MinimediError> {
        let encoded = serde_json::to_string(&self.turns)
            .map_err(|e| MinimediError::Internal(format!("failed to encode transcript: {e}")))?;
        self.port.save(&self.key, &encoded)
    }
}
