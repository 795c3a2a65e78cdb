// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration for one intake session.
//!
//! [`ConversationController`] owns the transcript and the reconciler. A
//! submission appends the user turn, asks the model for a reply with the
//! whole transcript as context, appends the visible part of that reply, and
//! hands any extracted payload to the reconciler in the background.
//!
//! Only one submission may be outstanding at a time. Backend writes do not
//! hold that slot; they run in order on a background write queue that
//! [`flush`](ConversationController::flush) and
//! [`reset`](ConversationController::reset) wait on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use minimedi_config::MinimediConfig;
use minimedi_core::{
    MinimediError, ModelService, PersistencePort, RecordBackend, RecordId, SessionRecord, Turn,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::extractor::{extract, ExtractionError};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::record_cache::RecordCache;
use crate::transcript::TranscriptStore;
use crate::writer::WriteQueue;

/// What a successful submission did to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered and its display text was appended.
    Replied {
        reply: String,
        /// Whether a payload was handed to the reconciler.
        reconciling: bool,
    },
    /// The model call failed and the fallback turn was appended.
    Fallback { reply: String },
    /// The session was reset while the model call was in flight; the reply was dropped.
    Discarded,
}

/// Holds the single submission slot until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ConversationController {
    model: Arc<dyn ModelService>,
    reconciler: Arc<Reconciler>,
    transcript: Mutex<TranscriptStore>,
    fallback_reply: String,
    in_flight: AtomicBool,
    epoch: AtomicU64,
    writes: WriteQueue,
}

impl std::fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController")
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .field("epoch", &self.epoch.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ConversationController {
    pub fn new(
        model: Arc<dyn ModelService>,
        reconciler: Arc<Reconciler>,
        transcript: TranscriptStore,
        fallback_reply: impl Into<String>,
    ) -> Self {
        Self {
            model,
            writes: WriteQueue::new(Arc::clone(&reconciler)),
            reconciler,
            transcript: Mutex::new(transcript),
            fallback_reply: fallback_reply.into(),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Restores (or seeds) the session from `port` and wires the engine per `config`.
    pub fn from_config(
        config: &MinimediConfig,
        port: Arc<dyn PersistencePort>,
        model: Arc<dyn ModelService>,
        backend: Arc<dyn RecordBackend>,
    ) -> Self {
        let transcript = TranscriptStore::open(
            port.clone(),
            config.session.transcript_key.clone(),
            config.session.greeting.clone(),
        );
        let cache = RecordCache::open(port, config.session.record_key.clone());
        let reconciler = Reconciler::new(backend, cache, &config.reconcile);
        Self::new(
            model,
            Arc::new(reconciler),
            transcript,
            config.session.fallback_reply.clone(),
        )
    }

    /// Runs one conversational turn.
    ///
    /// Fails only when the message is blank or another submission is in
    /// flight. Model, payload, persistence, and backend failures are logged
    /// and absorbed.
    pub async fn submit(&self, text: &str) -> Result<TurnOutcome, MinimediError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MinimediError::EmptyMessage);
        }
        let _slot = InFlight::acquire(&self.in_flight).ok_or(MinimediError::Busy)?;

        let (epoch, context) = {
            let mut transcript = self.transcript.lock().await;
            if let Err(e) = transcript.append(Turn::user(text)) {
                warn!(error = %e, "failed to persist user turn");
            }
            (self.epoch.load(Ordering::Acquire), transcript.all().to_vec())
        };

        debug!(turns = context.len(), "requesting model reply");
        let response = self.model.converse(&context).await;

        let mut transcript = self.transcript.lock().await;
        if self.epoch.load(Ordering::Acquire) != epoch {
            info!("session was reset during the model call, discarding reply");
            return Ok(TurnOutcome::Discarded);
        }

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "model call failed, appending fallback reply");
                if let Err(e) = transcript.append(Turn::assistant(self.fallback_reply.clone())) {
                    warn!(error = %e, "failed to persist fallback turn");
                }
                return Ok(TurnOutcome::Fallback {
                    reply: self.fallback_reply.clone(),
                });
            }
        };

        let extraction = extract(&raw);
        if let Err(e) = transcript.append(Turn::assistant(extraction.display_text.clone())) {
            warn!(error = %e, "failed to persist assistant turn");
        }

        let reconciling = match extraction.payload {
            Ok(profile) => {
                // Queued under the transcript lock so a concurrent reset
                // always observes this write in its flush.
                self.writes.reconcile(
                    profile,
                    extraction.display_text.clone(),
                    transcript.all().to_vec(),
                );
                true
            }
            Err(ExtractionError::Absent) => false,
            Err(e) => {
                warn!(error = %e, "ignoring unusable data block");
                false
            }
        };

        Ok(TurnOutcome::Replied {
            reply: extraction.display_text,
            reconciling,
        })
    }

    /// Waits for every backend write queued so far.
    pub async fn flush(&self) {
        self.writes.flush().await;
    }

    /// Ends the session.
    ///
    /// Pending writes are drained, the cached record (if any) receives one
    /// final analysis update built from the transcript as it stood, then the
    /// record cache and the transcript are cleared and the greeting reseeded.
    /// A reply still in flight is discarded when it arrives.
    pub async fn reset(&self) -> ReconcileOutcome {
        let mut transcript = self.transcript.lock().await;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.flush().await;

        let outcome = self.reconciler.finalize(transcript.all()).await;
        if let Err(e) = transcript.reset() {
            warn!(error = %e, "failed to persist reset transcript");
        }
        info!(?outcome, "session reset");
        outcome
    }

    /// Saved records on the backend, newest first.
    ///
    /// Queued writes are flushed first so this session's record is current.
    pub async fn history(&self) -> Result<Vec<SessionRecord>, MinimediError> {
        self.flush().await;
        self.reconciler.records().await
    }

    /// Deletes one saved record after pending writes have landed.
    ///
    /// Deleting this session's own record drops the cached id; the
    /// transcript is kept and the next payload creates a new record.
    pub async fn delete_record(&self, id: &RecordId) -> Result<(), MinimediError> {
        self.flush().await;
        self.reconciler.delete(id).await
    }

    /// Deletes every saved record and drops the cached id.
    pub async fn clear_records(&self) -> Result<u64, MinimediError> {
        self.flush().await;
        self.reconciler.clear_all().await
    }

    /// A copy of the transcript.
    pub async fn transcript(&self) -> Vec<Turn> {
        self.transcript.lock().await.all().to_vec()
    }

    pub async fn cached_record_id(&self) -> Option<RecordId> {
        self.reconciler.cached_id().await
    }

    /// Returns true while a submission is waiting on the model.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}
