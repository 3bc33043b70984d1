// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Self-service profile operations.
//!
//! All three operate on the caller's own record, looked up by the verified
//! token subject. Callers never pass a user id.

use crate::error::ApiError;
use crate::models::{ProfilePatch, User};
use crate::storage::UserStore;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 128;

/// Fetch the caller's record by token subject.
pub fn get_self(store: &dyn UserStore, subject_id: &str) -> Result<User, ApiError> {
    store
        .find_by_external_id(subject_id)?
        .ok_or_else(|| ApiError::not_found("no local user for this identity"))
}

/// Apply an allow-listed patch to the caller's record.
pub fn update_self(
    store: &dyn UserStore,
    subject_id: &str,
    patch: &ProfilePatch,
) -> Result<User, ApiError> {
    validate_patch(patch)?;

    let user = get_self(store, subject_id)?;
    store
        .update_by_id(&user.id, patch)?
        .ok_or_else(|| ApiError::not_found("no local user for this identity"))
}

/// Remove the caller's record.
pub fn delete_self(store: &dyn UserStore, subject_id: &str) -> Result<(), ApiError> {
    let user = get_self(store, subject_id)?;
    if store.delete_by_id(&user.id)? {
        Ok(())
    } else {
        Err(ApiError::not_found("no local user for this identity"))
    }
}

fn validate_patch(patch: &ProfilePatch) -> Result<(), ApiError> {
    if patch.is_empty() {
        return Err(ApiError::validation("patch must set at least one field"));
    }
    if let Some(username) = &patch.username {
        let len = username.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
            return Err(ApiError::validation(format!(
                "username must be {USERNAME_MIN}..={USERNAME_MAX} characters"
            )));
        }
    }
    if let Some(url) = &patch.profile_picture_url {
        url::Url::parse(url)
            .map_err(|_| ApiError::validation("profilePictureUrl must be a valid URL"))?;
    }
    Ok(())
}
