// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-operation timing wrapper for any [`UserStore`].
//!
//! Emits one structured debug event per store call with the operation name
//! and elapsed time, so slow queries show up in the logs without touching
//! the store implementations themselves.

use std::time::Instant;

use super::{StoreResult, UpsertOutcome, UserStore};
use crate::models::{AuditEntry, ProfilePatch, User};

/// Decorator logging the duration of every store operation.
pub struct TimedStore<S> {
    inner: S,
}

impl<S: UserStore> TimedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    fn timed<T>(&self, op: &'static str, f: impl FnOnce(&S) -> StoreResult<T>) -> StoreResult<T> {
        let start = Instant::now();
        let result = f(&self.inner);
        tracing::debug!(
            op,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "store operation"
        );
        result
    }
}

impl<S: UserStore> UserStore for TimedStore<S> {
    fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.timed("find_by_id", |s| s.find_by_id(id))
    }

    fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        self.timed("find_by_external_id", |s| s.find_by_external_id(external_id))
    }

    fn upsert_by_external_id(&self, candidate: User) -> StoreResult<UpsertOutcome> {
        self.timed("upsert_by_external_id", |s| {
            s.upsert_by_external_id(candidate)
        })
    }

    fn update_by_id(&self, id: &str, patch: &ProfilePatch) -> StoreResult<Option<User>> {
        self.timed("update_by_id", |s| s.update_by_id(id, patch))
    }

    fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        self.timed("delete_by_id", |s| s.delete_by_id(id))
    }

    fn insert_audit(&self, entry: &AuditEntry) -> StoreResult<()> {
        self.timed("insert_audit", |s| s.insert_audit(entry))
    }

    fn audit_for_user(&self, user_id: &str, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        self.timed("audit_for_user", |s| s.audit_for_user(user_id, limit))
    }

    fn count_users(&self) -> StoreResult<u64> {
        self.timed("count_users", |s| s.count_users())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UserDatabase;
    use chrono::Utc;

    #[test]
    fn timed_store_delegates() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimedStore::new(UserDatabase::open(&dir.path().join("t.redb")).unwrap());

        let outcome = store
            .upsert_by_external_id(User {
                id: "u1".to_string(),
                external_id: "auth0|1".to_string(),
                email: "a@example.com".to_string(),
                username: "a_1234abcd".to_string(),
                given_name: None,
                family_name: None,
                profile_picture_url: None,
                email_verified: true,
                last_login: Utc::now(),
                created_at: Utc::now(),
            })
            .unwrap();
        assert!(outcome.created);
        assert_eq!(store.count_users().unwrap(), 1);
        assert!(store.find_by_id("u1").unwrap().is_some());
    }
}
