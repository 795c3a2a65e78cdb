// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key/value port backing the transcript and the record cache.

use crate::error::MinimediError;

/// Synchronous key/value storage for session state.
///
/// Values are opaque strings (the engine stores JSON). Implementations must
/// make a successful `save` visible to every later `load` of the same key,
/// including after a process restart for durable backends.
pub trait PersistencePort: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written or removed.
    fn load(&self, key: &str) -> Result<Option<String>, MinimediError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), MinimediError>;

    /// Deletes the key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), MinimediError>;
}
