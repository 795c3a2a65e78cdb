// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock record backend with call recording and failure injection.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use minimedi_core::{
    MinimediError, NewSessionRecord, RecordBackend, RecordId, RecordPatch, SessionRecord,
};

#[derive(Default)]
struct BackendState {
    creates: Vec<NewSessionRecord>,
    updates: Vec<(RecordId, RecordPatch)>,
    deletes: Vec<RecordId>,
    records: HashMap<RecordId, SessionRecord>,
    next_id: u64,
    failing_creates: u32,
    failing_updates: u32,
}

/// An in-memory record backend that issues sequential ids starting at 1.
///
/// Every create, update, and delete attempt is recorded, including failed
/// ones. Updates and deletes against ids it does not hold return
/// [`MinimediError::RecordNotFound`].
#[derive(Default)]
pub struct MockRecordBackend {
    state: Mutex<BackendState>,
    create_delay: Option<Duration>,
}

impl MockRecordBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay each create, widening the window in which writes can race.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Make the next `n` creates fail with a 503.
    pub async fn fail_next_creates(&self, n: u32) {
        self.state.lock().await.failing_creates = n;
    }

    /// Make the next `n` updates fail with a 500.
    pub async fn fail_next_updates(&self, n: u32) {
        self.state.lock().await.failing_updates = n;
    }

    /// Delete a record out-of-band, as an administrator would.
    ///
    /// Unlike [`RecordBackend::delete_record`] this is not recorded as a call.
    pub async fn delete_out_of_band(&self, id: &RecordId) {
        self.state.lock().await.records.remove(id);
    }

    pub async fn creates(&self) -> Vec<NewSessionRecord> {
        self.state.lock().await.creates.clone()
    }

    pub async fn updates(&self) -> Vec<(RecordId, RecordPatch)> {
        self.state.lock().await.updates.clone()
    }

    pub async fn deletes(&self) -> Vec<RecordId> {
        self.state.lock().await.deletes.clone()
    }

    /// The current server-side state of a record.
    pub async fn record(&self, id: &RecordId) -> Option<SessionRecord> {
        self.state.lock().await.records.get(id).cloned()
    }
}

#[async_trait]
impl RecordBackend for MockRecordBackend {
    async fn create_record(
        &self,
        record: &NewSessionRecord,
    ) -> Result<SessionRecord, MinimediError> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        state.creates.push(record.clone());
        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(MinimediError::Api {
                status: 503,
                message: "mock create failure".to_string(),
            });
        }

        state.next_id += 1;
        let id = RecordId(state.next_id.to_string());
        let created = SessionRecord::from_new(id.clone(), record);
        state.records.insert(id, created.clone());
        Ok(created)
    }

    async fn update_record(
        &self,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<(), MinimediError> {
        let mut state = self.state.lock().await;
        state.updates.push((id.clone(), patch.clone()));
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(MinimediError::Api {
                status: 500,
                message: "mock update failure".to_string(),
            });
        }

        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| MinimediError::RecordNotFound { id: id.clone() })?;
        if let Some(name) = &patch.patient_name {
            record.patient_name = Some(name.clone());
        }
        if let Some(age) = patch.age {
            record.age = Some(i64::from(age));
        }
        if let Some(gender) = &patch.gender {
            record.gender = Some(gender.clone());
        }
        if let Some(description) = &patch.description {
            record.description = Some(description.clone());
        }
        if let Some(duration) = patch.duration {
            record.duration = Some(i64::from(duration));
        }
        if let Some(analysis) = &patch.ai_analysis {
            record.ai_analysis = Some(analysis.clone());
        }
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<SessionRecord>, MinimediError> {
        let state = self.state.lock().await;
        let mut records: Vec<_> = state.records.values().cloned().collect();
        // Ids are issued sequentially, so the highest id is the newest.
        records.sort_by_key(|r| Reverse(r.id.as_str().parse::<u64>().unwrap_or(0)));
        Ok(records)
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), MinimediError> {
        let mut state = self.state.lock().await;
        state.deletes.push(id.clone());
        state
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MinimediError::RecordNotFound { id: id.clone() })
    }

    async fn clear_records(&self) -> Result<u64, MinimediError> {
        let mut state = self.state.lock().await;
        let removed = state.records.len() as u64;
        state.records.clear();
        Ok(removed)
    }
}
