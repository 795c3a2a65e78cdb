// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence adapters for MiniMedi session state.
//!
//! Both adapters implement [`PersistencePort`](minimedi_core::PersistencePort):
//! [`SqlitePersistence`] keeps entries in a single-table SQLite database with
//! embedded migrations, [`MemoryPersistence`] keeps them in process memory.

pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::MemoryPersistence;
pub use sqlite::SqlitePersistence;
