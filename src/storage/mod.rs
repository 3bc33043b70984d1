// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Layer
//!
//! The [`UserStore`] trait is the seam between HTTP handlers and
//! persistence. Production wires a redb-backed [`UserDatabase`] wrapped in
//! [`TimedStore`]; tests use the same stack on a tempdir.

pub mod db;
pub mod timing;

use thiserror::Error;

use crate::models::{AuditEntry, ProfilePatch, User};

pub use db::UserDatabase;
pub use timing::TimedStore;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("index corruption: {0}")]
    IndexCorruption(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// UserStore Trait
// =============================================================================

/// Result of an upsert: the authoritative stored record plus whether this
/// call created it.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub user: User,
    pub created: bool,
}

/// Persistence operations for users and the audit trail.
///
/// Object-safe so that the application state can hold `Arc<dyn UserStore>`.
/// All methods are synchronous; redb transactions are short and handlers
/// call through `spawn_blocking`-free direct access, matching the embedded
/// database's latency profile.
pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    /// Atomically create or refresh a user keyed on `external_id`.
    fn upsert_by_external_id(&self, candidate: User) -> StoreResult<UpsertOutcome>;

    /// Apply an allow-listed patch. `Ok(None)` when no such user exists.
    fn update_by_id(&self, id: &str, patch: &ProfilePatch) -> StoreResult<Option<User>>;

    /// Hard delete. Returns whether a record was removed.
    fn delete_by_id(&self, id: &str) -> StoreResult<bool>;

    fn insert_audit(&self, entry: &AuditEntry) -> StoreResult<()>;

    /// Newest-first audit entries for one subject, capped at `limit`.
    fn audit_for_user(&self, user_id: &str, limit: usize) -> StoreResult<Vec<AuditEntry>>;

    fn count_users(&self) -> StoreResult<u64>;
}
