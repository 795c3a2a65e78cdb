// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable hint of which backend record belongs to the current session.

use std::sync::Arc;

use minimedi_core::{MinimediError, PersistencePort, RecordId};
use tracing::warn;

/// Holds at most one [`RecordId`], stored JSON-encoded under its own key.
///
/// The backend remains the system of record; a cached id may be stale.
pub struct RecordCache {
    port: Arc<dyn PersistencePort>,
    key: String,
    id: Option<RecordId>,
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl RecordCache {
    /// Restores the cached id. Missing, unreadable, or undecodable entries yield an empty cache.
    pub fn open(port: Arc<dyn PersistencePort>, key: impl Into<String>) -> Self {
        let key = key.into();
        let id = match port.load(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<RecordId>(raw.trim()) {
                Ok(id) if !id.as_str().is_empty() => Some(id),
                Ok(_) => None,
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "stored record id is corrupt, ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "failed to load record id");
                None
            }
        };
        Self { port, key, id }
    }

    pub fn get(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    /// Caches `id` and persists it. The in-memory value is kept even if the save fails.
    pub fn set(&mut self, id: RecordId) -> Result<(), MinimediError> {
        let encoded = serde_json::to_string(&id)
            .map_err(|e| MinimediError::Internal(format!("failed to encode record id: {e}")))?;
        self.id = Some(id);
        self.port.save(&self.key, &encoded)
    }

    /// Forgets the cached id and removes the stored entry.
    pub fn clear(&mut self) -> Result<(), MinimediError> {
        self.id = None;
        self.port.remove(&self.key)
    }
}
