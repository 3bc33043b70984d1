// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user/audit database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: id → serialized User (JSON bytes)
//! - `users_by_external_id`: external_id → id (unique secondary index)
//! - `users_by_username`: username → id (unique secondary index)
//! - `audit_log`: composite key (user_id|!timestamp|entry_id) → serialized
//!   AuditEntry, for descending-time per-user range scans
//!
//! Each logical operation runs in a single write transaction, so the
//! lookup-or-create of `upsert_by_external_id` is atomic: two concurrent
//! first-logins for one external id serialize on the write lock and the
//! second observes the first's index entry.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};

use super::{StoreError, StoreResult, UpsertOutcome, UserStore};
use crate::models::{AuditEntry, ProfilePatch, User};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: id → serialized User (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: identity-provider subject → user id.
const USERS_BY_EXTERNAL_ID: TableDefinition<&str, &str> =
    TableDefinition::new("users_by_external_id");

/// Unique index: username → user id.
const USERS_BY_USERNAME: TableDefinition<&str, &str> = TableDefinition::new("users_by_username");

/// Audit log: composite key `user_id|!timestamp_be|entry_id` → JSON bytes.
const AUDIT_LOG: TableDefinition<&[u8], &[u8]> = TableDefinition::new("audit_log");

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the audit_log table.
///
/// The inverted timestamp ensures newest-first ordering when scanning
/// forward from the user prefix.
fn audit_key(user_id: &str, timestamp: i64, entry_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(user_id.len() + 1 + 8 + 1 + entry_id.len());
    key.extend_from_slice(user_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(entry_id.as_bytes());
    key
}

fn audit_prefix(user_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user_id.len() + 1);
    prefix.extend_from_slice(user_id.as_bytes());
    prefix.push(b'|');
    prefix
}

fn audit_prefix_end(user_id: &str) -> Vec<u8> {
    let mut end = audit_prefix(user_id);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

// =============================================================================
// UserDatabase
// =============================================================================

/// Embedded ACID store for users and audit entries.
pub struct UserDatabase {
    db: Database,
}

impl UserDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EXTERNAL_ID)?;
            let _ = write_txn.open_table(USERS_BY_USERNAME)?;
            let _ = write_txn.open_table(AUDIT_LOG)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl UserStore for UserDatabase {
    fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let by_external = read_txn.open_table(USERS_BY_EXTERNAL_ID)?;
        let id = match by_external.get(external_id)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(StoreError::IndexCorruption(format!(
                "external id {external_id} points at missing user {id}"
            ))),
        }
    }

    /// Insert-or-refresh in one transaction, keyed on `external_id`.
    ///
    /// The candidate carries the full create-branch record; on the update
    /// branch only the provider-owned profile fields and `last_login` are
    /// taken from it.
    fn upsert_by_external_id(&self, candidate: User) -> StoreResult<UpsertOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_external = write_txn.open_table(USERS_BY_EXTERNAL_ID)?;
            let mut by_username = write_txn.open_table(USERS_BY_USERNAME)?;

            let existing_id = by_external
                .get(candidate.external_id.as_str())?
                .map(|guard| guard.value().to_string());

            match existing_id {
                None => {
                    if by_username.get(candidate.username.as_str())?.is_some() {
                        // Abort: dropping the uncommitted transaction rolls back.
                        return Err(StoreError::UsernameTaken(candidate.username));
                    }

                    let json = serde_json::to_vec(&candidate)?;
                    users.insert(candidate.id.as_str(), json.as_slice())?;
                    by_external.insert(candidate.external_id.as_str(), candidate.id.as_str())?;
                    by_username.insert(candidate.username.as_str(), candidate.id.as_str())?;

                    UpsertOutcome {
                        user: candidate,
                        created: true,
                    }
                }
                Some(id) => {
                    let existing_bytes = {
                        let guard = users.get(id.as_str())?.ok_or_else(|| {
                            StoreError::IndexCorruption(format!(
                                "external id {} points at missing user {id}",
                                candidate.external_id
                            ))
                        })?;
                        guard.value().to_vec()
                    };

                    let mut user: User = serde_json::from_slice(&existing_bytes)?;
                    user.last_login = candidate.last_login;
                    user.given_name = candidate.given_name;
                    user.family_name = candidate.family_name;
                    user.profile_picture_url = candidate.profile_picture_url;

                    let json = serde_json::to_vec(&user)?;
                    users.insert(id.as_str(), json.as_slice())?;

                    UpsertOutcome {
                        user,
                        created: false,
                    }
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Apply an allow-listed patch, maintaining the username index.
    fn update_by_id(&self, id: &str, patch: &ProfilePatch) -> StoreResult<Option<User>> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_username = write_txn.open_table(USERS_BY_USERNAME)?;

            let existing_bytes = match users.get(id)? {
                Some(guard) => guard.value().to_vec(),
                None => return Ok(None),
            };
            let mut user: User = serde_json::from_slice(&existing_bytes)?;

            if let Some(new_username) = &patch.username {
                if *new_username != user.username {
                    let taken = by_username
                        .get(new_username.as_str())?
                        .map(|guard| guard.value().to_string())
                        .is_some_and(|owner| owner != id);
                    if taken {
                        return Err(StoreError::UsernameTaken(new_username.clone()));
                    }
                    by_username.remove(user.username.as_str())?;
                    by_username.insert(new_username.as_str(), id)?;
                    user.username = new_username.clone();
                }
            }
            if let Some(given_name) = &patch.given_name {
                user.given_name = Some(given_name.clone());
            }
            if let Some(family_name) = &patch.family_name {
                user.family_name = Some(family_name.clone());
            }
            if let Some(url) = &patch.profile_picture_url {
                user.profile_picture_url = Some(url.clone());
            }

            let json = serde_json::to_vec(&user)?;
            users.insert(id, json.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    /// Hard delete, removing both secondary index entries.
    fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_external = write_txn.open_table(USERS_BY_EXTERNAL_ID)?;
            let mut by_username = write_txn.open_table(USERS_BY_USERNAME)?;

            let existing_bytes = match users.remove(id)? {
                Some(guard) => guard.value().to_vec(),
                None => return Ok(false),
            };
            let user: User = serde_json::from_slice(&existing_bytes)?;
            by_external.remove(user.external_id.as_str())?;
            by_username.remove(user.username.as_str())?;
            true
        };
        write_txn.commit()?;
        Ok(removed)
    }

    fn insert_audit(&self, entry: &AuditEntry) -> StoreResult<()> {
        let key = audit_key(&entry.user_id, entry.timestamp.timestamp(), &entry.id);
        let json = serde_json::to_vec(entry)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut audit = write_txn.open_table(AUDIT_LOG)?;
            audit.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Newest-first audit entries for one subject.
    fn audit_for_user(&self, user_id: &str, limit: usize) -> StoreResult<Vec<AuditEntry>> {
        let read_txn = self.db.begin_read()?;
        let audit = read_txn.open_table(AUDIT_LOG)?;

        let prefix = audit_prefix(user_id);
        let prefix_end = audit_prefix_end(user_id);

        let mut entries = Vec::new();
        for item in audit.range(prefix.as_slice()..prefix_end.as_slice())? {
            let (_, value) = item?;
            entries.push(serde_json::from_slice(value.value())?);
            if entries.len() >= limit {
                break;
            }
        }
        Ok(entries)
    }

    fn count_users(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        Ok(users.len()?)
    }
}
