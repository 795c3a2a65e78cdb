// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port for the backend that owns session records.

use async_trait::async_trait;

use crate::error::MinimediError;
use crate::types::{NewSessionRecord, RecordId, RecordPatch, SessionRecord};

/// The system of record for session records.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Creates a record and returns it with its server-issued identifier.
    async fn create_record(
        &self,
        record: &NewSessionRecord,
    ) -> Result<SessionRecord, MinimediError>;

    /// Applies a partial update to an existing record.
    ///
    /// Returns [`MinimediError::RecordNotFound`] when the identifier no
    /// longer exists on the backend.
    async fn update_record(&self, id: &RecordId, patch: &RecordPatch)
        -> Result<(), MinimediError>;

    /// Lists every record visible to the caller, newest first.
    async fn list_records(&self) -> Result<Vec<SessionRecord>, MinimediError>;

    /// Deletes one record.
    ///
    /// Returns [`MinimediError::RecordNotFound`] when the identifier does
    /// not exist on the backend.
    async fn delete_record(&self, id: &RecordId) -> Result<(), MinimediError>;

    /// Deletes every record visible to the caller and returns how many were removed.
    async fn clear_records(&self) -> Result<u64, MinimediError>;
}
