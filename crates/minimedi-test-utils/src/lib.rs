// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for MiniMedi integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockModel`] - Mock model service with queued replies, failures, and an optional gate
//! - [`MockRecordBackend`] - Mock record backend with call recording and failure injection
//! - [`TestHarness`] - Controller wired to both mocks over in-memory persistence

pub mod harness;
pub mod mock_backend;
pub mod mock_model;

pub use harness::{FixedRiskScorer, TestHarness};
pub use mock_backend::MockRecordBackend;
pub use mock_model::MockModel;
