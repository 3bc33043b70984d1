// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity-provider sync.
//!
//! The provider's post-login hook calls `POST /users/sync` with the
//! authenticated profile. The first sync for a subject creates the local
//! user; subsequent syncs refresh `last_login` and the provider-owned
//! profile fields. The operation is idempotent per subject.

use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::User;
use crate::storage::UserStore;

/// Profile payload from the identity provider's login hook.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SyncProfile {
    /// Identity-provider subject, e.g. `"auth0|abc123"`.
    pub auth0_id: String,
    pub email: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Result of one sync call.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub user: User,
    pub created: bool,
}

impl SyncProfile {
    fn validate(&self) -> Result<(), ApiError> {
        if self.auth0_id.trim().is_empty() {
            return Err(ApiError::validation("auth0Id must not be empty"));
        }
        validate_email(&self.email)?;
        if let Some(picture) = &self.picture {
            url::Url::parse(picture)
                .map_err(|_| ApiError::validation("picture must be a valid URL"))?;
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::validation("email must contain '@'"));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ApiError::validation("email is malformed"));
    }
    Ok(())
}

/// Derive a username from the email's local part.
///
/// Lowercased, with every character outside `[a-z0-9_]` replaced by `_`,
/// then suffixed with `_` and the first group of a fresh v4 UUID (8 hex
/// chars) so two users sharing a local part get distinct names.
pub fn generate_username(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let sanitized: String = local
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    let uuid = Uuid::new_v4().to_string();
    let suffix = uuid.split('-').next().unwrap_or("00000000");
    format!("{sanitized}_{suffix}")
}

/// Create or refresh the local user for this provider profile.
pub fn sync(store: &dyn UserStore, profile: SyncProfile) -> Result<SyncOutcome, ApiError> {
    profile.validate()?;

    let now = Utc::now();
    let candidate = User {
        id: Uuid::new_v4().to_string(),
        external_id: profile.auth0_id,
        email: profile.email.clone(),
        username: generate_username(&profile.email),
        given_name: profile.given_name,
        family_name: profile.family_name,
        profile_picture_url: profile.picture,
        email_verified: true,
        last_login: now,
        created_at: now,
    };

    let outcome = store.upsert_by_external_id(candidate)?;
    Ok(SyncOutcome {
        user: outcome.user,
        created: outcome.created,
    })
}
