// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `TestHarness` assembles a conversation controller over a mock model, a
//! mock record backend, and shared in-memory persistence. `reopen()` builds
//! a second controller over the same persistence to simulate a restart.

use std::sync::Arc;

use minimedi_config::{MinimediConfig, SavePolicy, StaleRecordPolicy};
use minimedi_core::{ExtractedProfile, PersistencePort};
use minimedi_intake::{
    ConversationController, Reconciler, RecordCache, RiskScorer, TranscriptStore,
};
use minimedi_storage::MemoryPersistence;

use crate::mock_backend::MockRecordBackend;
use crate::mock_model::MockModel;

/// Risk scorer that always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRiskScorer(pub u8);

impl RiskScorer for FixedRiskScorer {
    fn score(&self, _profile: &ExtractedProfile) -> u8 {
        self.0
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    config: MinimediConfig,
    persistence: Option<Arc<MemoryPersistence>>,
    model: Option<MockModel>,
    backend: Option<MockRecordBackend>,
    risk_score: u8,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            config: MinimediConfig::default(),
            persistence: None,
            model: None,
            backend: None,
            risk_score: 33,
        }
    }

    /// Set mock model replies.
    pub fn with_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies = replies.into_iter().map(Into::into).collect();
        self
    }

    /// Use a preconfigured model (e.g. a gated one). Replies set with
    /// `with_replies` are ignored.
    pub fn with_model(mut self, model: MockModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_backend(mut self, backend: MockRecordBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Start from existing persisted state.
    pub fn with_persistence(mut self, persistence: Arc<MemoryPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_save_policy(mut self, policy: SavePolicy) -> Self {
        self.config.reconcile.save_policy = policy;
        self
    }

    pub fn with_stale_policy(mut self, policy: StaleRecordPolicy) -> Self {
        self.config.reconcile.stale_record = policy;
        self
    }

    pub fn with_risk_score(mut self, score: u8) -> Self {
        self.risk_score = score;
        self
    }

    /// Build the harness.
    pub fn build(self) -> TestHarness {
        let model = Arc::new(
            self.model
                .unwrap_or_else(|| MockModel::with_replies(self.replies)),
        );
        let backend = Arc::new(self.backend.unwrap_or_default());
        let persistence = self
            .persistence
            .unwrap_or_else(|| Arc::new(MemoryPersistence::new()));

        let controller = assemble(
            &model,
            &backend,
            &persistence,
            &self.config,
            self.risk_score,
        );
        TestHarness {
            model,
            backend,
            persistence,
            config: self.config,
            risk_score: self.risk_score,
            controller,
        }
    }
}

fn assemble(
    model: &Arc<MockModel>,
    backend: &Arc<MockRecordBackend>,
    persistence: &Arc<MemoryPersistence>,
    config: &MinimediConfig,
    risk_score: u8,
) -> ConversationController {
    let port: Arc<dyn PersistencePort> = persistence.clone();
    let session = &config.session;
    let transcript = TranscriptStore::open(
        port.clone(),
        session.transcript_key.clone(),
        session.greeting.clone(),
    );
    let cache = RecordCache::open(port, session.record_key.clone());
    let reconciler = Reconciler::new(backend.clone(), cache, &config.reconcile)
        .with_scorer(Arc::new(FixedRiskScorer(risk_score)));
    ConversationController::new(
        model.clone(),
        Arc::new(reconciler),
        transcript,
        session.fallback_reply.clone(),
    )
}

/// A complete engine with mock collaborators and in-memory storage.
pub struct TestHarness {
    /// The mock model service.
    pub model: Arc<MockModel>,
    /// The mock record backend.
    pub backend: Arc<MockRecordBackend>,
    /// Persistence shared by every controller this harness builds.
    pub persistence: Arc<MemoryPersistence>,
    /// Configuration the controller was built from.
    pub config: MinimediConfig,
    risk_score: u8,
    controller: ConversationController,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The controller built with the harness.
    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    /// Builds a fresh controller over the same persistence and collaborators,
    /// as a restarted process would.
    pub fn reopen(&self) -> ConversationController {
        assemble(
            &self.model,
            &self.backend,
            &self.persistence,
            &self.config,
            self.risk_score,
        )
    }

    /// Raw persisted transcript JSON, if any.
    pub fn stored_transcript(&self) -> Option<String> {
        self.persistence.raw(&self.config.session.transcript_key)
    }

    /// Raw persisted record id JSON, if any.
    pub fn stored_record_id(&self) -> Option<String> {
        self.persistence.raw(&self.config.session.record_key)
    }
}
