// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered background queue for record writes.
//!
//! Reconciliations are handed to a single worker over an mpsc channel and
//! run one at a time in submission order, so a later turn's patch always
//! reaches the backend after an earlier one. A flush queues a barrier and
//! waits for the worker to reach it.

use std::sync::{Arc, Mutex};

use minimedi_core::{ExtractedProfile, Turn};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::reconciler::Reconciler;

enum WriteJob {
    Reconcile {
        profile: ExtractedProfile,
        display_text: String,
        transcript: Vec<Turn>,
    },
    Barrier(oneshot::Sender<()>),
}

type IdleWorker = (mpsc::UnboundedReceiver<WriteJob>, Arc<Reconciler>);

/// FIFO queue of record writes drained by one background task.
///
/// The worker is spawned on first use, so the queue can be built outside a
/// runtime. It exits once the queue is dropped and every queued job has run.
pub(crate) struct WriteQueue {
    jobs: mpsc::UnboundedSender<WriteJob>,
    idle: Mutex<Option<IdleWorker>>,
}

impl WriteQueue {
    pub(crate) fn new(reconciler: Arc<Reconciler>) -> Self {
        let (jobs, receiver) = mpsc::unbounded_channel();
        Self {
            jobs,
            idle: Mutex::new(Some((receiver, reconciler))),
        }
    }

    /// Queues a reconciliation behind every write queued before it.
    pub(crate) fn reconcile(
        &self,
        profile: ExtractedProfile,
        display_text: String,
        transcript: Vec<Turn>,
    ) {
        self.send(WriteJob::Reconcile {
            profile,
            display_text,
            transcript,
        });
    }

    /// Waits until every write queued before this call has finished.
    pub(crate) async fn flush(&self) {
        let (done, reached) = oneshot::channel();
        if self.send(WriteJob::Barrier(done)) {
            // An Err means the worker died; nothing is left to wait for.
            let _ = reached.await;
        }
    }

    fn send(&self, job: WriteJob) -> bool {
        let idle = self.idle.lock().ok().and_then(|mut idle| idle.take());
        if let Some((receiver, reconciler)) = idle {
            tokio::spawn(drain(receiver, reconciler));
        }
        if self.jobs.send(job).is_err() {
            warn!("record write worker has stopped, dropping write");
            return false;
        }
        true
    }
}

async fn drain(mut jobs: mpsc::UnboundedReceiver<WriteJob>, reconciler: Arc<Reconciler>) {
    while let Some(job) = jobs.recv().await {
        match job {
            WriteJob::Reconcile {
                profile,
                display_text,
                transcript,
            } => {
                let outcome = reconciler
                    .reconcile(Some(&profile), &display_text, &transcript)
                    .await;
                debug!(?outcome, "reconciliation finished");
            }
            WriteJob::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("record write queue closed");
}
