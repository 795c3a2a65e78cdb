// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record reconciliation: turning per-turn profiles into backend writes.
//!
//! Each payload-bearing assistant turn produces exactly one write against the
//! session's single backend record. The first write creates the record with a
//! full field set; every later write is a partial update carrying only the
//! fields present in that turn plus a freshly computed analysis summary.
//!
//! The session record cache is guarded by an async mutex that stays locked
//! for the whole backend write. A reconciliation that starts while a create
//! is in flight waits for the identifier and then issues an update, so one
//! session never produces two creates.

use std::sync::Arc;

use minimedi_config::model::ReconcileConfig;
use minimedi_config::{SavePolicy, StaleRecordPolicy};
use minimedi_core::{
    ExtractedProfile, MinimediError, NewSessionRecord, RecordBackend, RecordId, RecordPatch,
    Role, SessionRecord, Severity, Turn,
};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::record_cache::RecordCache;

/// Name used on a created record when none has been extracted yet.
pub const DEFAULT_PATIENT_NAME: &str = "Guest";

/// Fixed title of every session record.
pub const RECORD_TITLE: &str = "Health Analysis Report";

/// Description used on a created record when no symptoms have been extracted yet.
pub const IN_PROGRESS_DESCRIPTION: &str = "In progress...";

pub const DEFAULT_GENDER: &str = "Unknown";
pub const DEFAULT_AGE: u32 = 0;
pub const DEFAULT_DURATION: u32 = 1;
pub const DEFAULT_SEVERITY: Severity = Severity::Medium;

/// Produces the risk score attached to a newly created record.
pub trait RiskScorer: Send + Sync {
    fn score(&self, profile: &ExtractedProfile) -> u8;
}

/// Uniform pseudo-random score in an inclusive range, standing in for a real model.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderRiskScorer {
    min: u8,
    max: u8,
}

impl PlaceholderRiskScorer {
    /// Creates a scorer over `min..=max`. Reversed bounds are swapped.
    pub fn new(min: u8, max: u8) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }
}

impl Default for PlaceholderRiskScorer {
    fn default() -> Self {
        let config = ReconcileConfig::default();
        Self::new(config.risk_score_min, config.risk_score_max)
    }
}

impl RiskScorer for PlaceholderRiskScorer {
    fn score(&self, _profile: &ExtractedProfile) -> u8 {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// What a reconciliation (or reset finalisation) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to write: no payload this turn, or no record cached at reset.
    Skipped,
    /// The save policy held the payload back.
    Deferred,
    /// A record was created and its id cached.
    Created(RecordId),
    /// The cached record was updated.
    Updated(RecordId),
    /// The cached record had vanished and a replacement was created.
    Recreated { stale: RecordId, id: RecordId },
    /// The cached record had vanished and the stale id was kept.
    StaleRecord(RecordId),
    /// The backend write failed; cache state is unchanged.
    Failed(String),
}

/// Concatenates every assistant turn in transcript order, separated by a blank line.
pub fn rolling_summary(transcript: &[Turn]) -> String {
    transcript
        .iter()
        .filter(|turn| turn.role == Role::Assistant)
        .map(|turn| turn.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the full field set for a first write, filling gaps with defaults.
pub fn create_request(
    profile: &ExtractedProfile,
    ai_analysis: impl Into<String>,
    risk_score: u8,
) -> NewSessionRecord {
    NewSessionRecord {
        patient_name: profile
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_PATIENT_NAME.to_string()),
        title: RECORD_TITLE.to_string(),
        description: profile
            .symptoms
            .clone()
            .unwrap_or_else(|| IN_PROGRESS_DESCRIPTION.to_string()),
        ai_analysis: ai_analysis.into(),
        age: profile.age.unwrap_or(DEFAULT_AGE),
        gender: profile
            .gender
            .clone()
            .unwrap_or_else(|| DEFAULT_GENDER.to_string()),
        duration: profile.duration.unwrap_or(DEFAULT_DURATION),
        severity: DEFAULT_SEVERITY,
        risk_score,
    }
}

/// Builds a partial update: the summary plus only the fields present in `profile`.
pub fn update_request(profile: &ExtractedProfile, summary: impl Into<String>) -> RecordPatch {
    RecordPatch {
        patient_name: profile.name.clone(),
        age: profile.age,
        gender: profile.gender.clone(),
        description: profile.symptoms.clone(),
        duration: profile.duration,
        ai_analysis: Some(summary.into()),
    }
}

/// Chooses create vs. update for each payload and owns the session record cache.
pub struct Reconciler {
    backend: Arc<dyn RecordBackend>,
    cache: Mutex<RecordCache>,
    scorer: Arc<dyn RiskScorer>,
    save_policy: SavePolicy,
    stale_policy: StaleRecordPolicy,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("save_policy", &self.save_policy)
            .field("stale_policy", &self.stale_policy)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(backend: Arc<dyn RecordBackend>, cache: RecordCache, config: &ReconcileConfig) -> Self {
        Self {
            backend,
            cache: Mutex::new(cache),
            scorer: Arc::new(PlaceholderRiskScorer::new(
                config.risk_score_min,
                config.risk_score_max,
            )),
            save_policy: config.save_policy,
            stale_policy: config.stale_record,
        }
    }

    /// Replaces the risk scorer.
    pub fn with_scorer(mut self, scorer: Arc<dyn RiskScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// The identifier currently cached for this session.
    pub async fn cached_id(&self) -> Option<RecordId> {
        self.cache.lock().await.get().cloned()
    }

    /// Writes one turn's extracted profile to the backend.
    ///
    /// `display_text` is the turn's visible text and `transcript` the
    /// transcript including that turn. Backend failures are logged and
    /// reported in the outcome; they never propagate.
    pub async fn reconcile(
        &self,
        profile: Option<&ExtractedProfile>,
        display_text: &str,
        transcript: &[Turn],
    ) -> ReconcileOutcome {
        let Some(profile) = profile else {
            return ReconcileOutcome::Skipped;
        };
        if self.save_policy == SavePolicy::OnCompletion && !profile.is_complete() {
            debug!("payload not flagged complete, deferring write");
            return ReconcileOutcome::Deferred;
        }

        let mut cache = self.cache.lock().await;
        let Some(id) = cache.get().cloned() else {
            let record = create_request(profile, display_text, self.scorer.score(profile));
            return match self.create(&mut cache, &record).await {
                Ok(id) => ReconcileOutcome::Created(id),
                Err(e) => {
                    warn!(error = %e, "record create failed, will retry on next payload");
                    ReconcileOutcome::Failed(e.to_string())
                }
            };
        };

        let summary = rolling_summary(transcript);
        let patch = update_request(profile, summary.clone());
        match self.backend.update_record(&id, &patch).await {
            Ok(()) => {
                debug!(record_id = id.as_str(), "record updated");
                ReconcileOutcome::Updated(id)
            }
            Err(MinimediError::RecordNotFound { .. }) => {
                self.handle_stale(&mut cache, id, profile, summary).await
            }
            Err(e) => {
                warn!(record_id = id.as_str(), error = %e, "record update failed, will retry on next payload");
                ReconcileOutcome::Failed(e.to_string())
            }
        }
    }

    /// Issues the final analysis update for a session that is being reset,
    /// then clears the cache whatever the result.
    pub async fn finalize(&self, transcript: &[Turn]) -> ReconcileOutcome {
        let mut cache = self.cache.lock().await;
        let Some(id) = cache.get().cloned() else {
            return ReconcileOutcome::Skipped;
        };

        let patch = RecordPatch::analysis(rolling_summary(transcript));
        let outcome = match self.backend.update_record(&id, &patch).await {
            Ok(()) => {
                info!(record_id = id.as_str(), "session record finalised");
                ReconcileOutcome::Updated(id)
            }
            Err(MinimediError::RecordNotFound { .. }) => {
                warn!(record_id = id.as_str(), "record vanished before finalisation, dropping id");
                ReconcileOutcome::StaleRecord(id)
            }
            Err(e) => {
                warn!(record_id = id.as_str(), error = %e, "final record update failed");
                ReconcileOutcome::Failed(e.to_string())
            }
        };

        if let Err(e) = cache.clear() {
            warn!(error = %e, "failed to remove cached record id");
        }
        outcome
    }

    /// Lists the saved records on the backend, newest first.
    pub async fn records(&self) -> Result<Vec<SessionRecord>, MinimediError> {
        self.backend.list_records().await
    }

    /// Deletes one saved record.
    ///
    /// When `id` is this session's cached record the cache is cleared too,
    /// including when the backend reports the record already gone, so the
    /// next payload starts a fresh record.
    pub async fn delete(&self, id: &RecordId) -> Result<(), MinimediError> {
        let mut cache = self.cache.lock().await;
        let result = self.backend.delete_record(id).await;
        let gone = matches!(result, Ok(()) | Err(MinimediError::RecordNotFound { .. }));
        if gone && cache.get() == Some(id) {
            info!(record_id = id.as_str(), "deleted the session's own record, dropping cached id");
            if let Err(e) = cache.clear() {
                warn!(error = %e, "failed to remove cached record id");
            }
        }
        if result.is_ok() {
            info!(record_id = id.as_str(), "record deleted");
        }
        result
    }

    /// Deletes every saved record and drops the cached id.
    pub async fn clear_all(&self) -> Result<u64, MinimediError> {
        let mut cache = self.cache.lock().await;
        let removed = self.backend.clear_records().await?;
        info!(removed, "all records deleted");
        if let Err(e) = cache.clear() {
            warn!(error = %e, "failed to remove cached record id");
        }
        Ok(removed)
    }

    async fn handle_stale(
        &self,
        cache: &mut RecordCache,
        stale: RecordId,
        profile: &ExtractedProfile,
        summary: String,
    ) -> ReconcileOutcome {
        match self.stale_policy {
            StaleRecordPolicy::Report => {
                error!(record_id = stale.as_str(), "cached record no longer exists on the backend");
                ReconcileOutcome::StaleRecord(stale)
            }
            StaleRecordPolicy::Recreate => {
                warn!(record_id = stale.as_str(), "cached record no longer exists, recreating");
                if let Err(e) = cache.clear() {
                    warn!(error = %e, "failed to remove stale record id");
                }
                let record = create_request(profile, summary, self.scorer.score(profile));
                match self.create(cache, &record).await {
                    Ok(id) => ReconcileOutcome::Recreated { stale, id },
                    Err(e) => {
                        warn!(error = %e, "replacement record create failed");
                        ReconcileOutcome::Failed(e.to_string())
                    }
                }
            }
        }
    }

    async fn create(
        &self,
        cache: &mut RecordCache,
        record: &NewSessionRecord,
    ) -> Result<RecordId, MinimediError> {
        let created = self.backend.create_record(record).await?;
        info!(
            record_id = created.id.as_str(),
            risk_score = record.risk_score,
            "session record created"
        );
        if let Err(e) = cache.set(created.id.clone()) {
            warn!(error = %e, "failed to persist record id");
        }
        Ok(created.id)
    }
}
