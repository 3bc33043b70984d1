// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Core Data Models
//!
//! Canonical records persisted by the storage layer plus the allow-listed
//! profile patch. All types derive `Serialize`/`Deserialize` and `ToSchema`
//! for JSON handling and OpenAPI documentation. Wire names are camelCase to
//! match the identity provider's payload convention.
//!
//! ## Model Categories
//!
//! - **User**: local mirror of an identity-provider account
//! - **AuditEntry**: immutable record of an authenticated action
//! - **ProfilePatch**: self-service profile mutation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// User
// =============================================================================

/// Canonical local identity record.
///
/// Exactly one `User` exists per distinct `external_id`; the record is
/// created and refreshed exclusively through the sync upsert, and mutated
/// through the self-service profile operations.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internally generated unique identifier (primary key).
    pub id: String,
    /// Identity-provider subject (e.g. `"auth0|abc123"`). Immutable once set;
    /// the reconciliation key for sync.
    pub external_id: String,
    /// Email address as reported by the provider.
    pub email: String,
    /// Unique username, generated on first sync if the provider supplies none.
    pub username: String,
    /// Optional given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Optional family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Optional profile picture URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    /// Set true when the record provenance is the trusted identity provider.
    pub email_verified: bool,
    /// Updated on every successful sync.
    pub last_login: DateTime<Utc>,
    /// Set once at creation, never changed afterwards.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Audit Entry
// =============================================================================

/// An immutable audit record of one authenticated request.
///
/// Entries are created per request, never mutated, and persisted
/// best-effort by the background audit worker.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique entry ID.
    pub id: String,
    /// Subject of the authenticated caller (references `User.external_id`,
    /// no ownership).
    pub user_id: String,
    /// Action descriptor, `"METHOD /path"`.
    pub action: String,
    /// Client IP address, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent, if sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Structured request metadata with sensitive fields redacted.
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    /// When the request was observed.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Profile Patch
// =============================================================================

/// Allow-listed mutable profile fields for `PATCH /users/me`.
///
/// `deny_unknown_fields` makes any key outside the allow-list a
/// deserialization error, so an invalid patch is rejected before anything
/// is applied.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfilePatch {
    /// New unique username (3..=128 characters).
    pub username: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Must parse as a URL.
    pub profile_picture_url: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.given_name.is_none()
            && self.family_name.is_none()
            && self.profile_picture_url.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_camel_case_without_empty_optionals() {
        let user = User {
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
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("givenName").is_none());
        assert!(json.get("familyName").is_none());
        assert_eq!(json["externalId"], "auth0|1");
        assert_eq!(json["emailVerified"], true);
    }

    #[test]
    fn audit_entry_round_trips() {
        let entry = AuditEntry {
            id: "e1".to_string(),
            user_id: "auth0|1".to_string(),
            action: "PATCH /users/me".to_string(),
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: None,
            metadata: serde_json::json!({"method": "PATCH"}),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<ProfilePatch, _> =
            serde_json::from_value(serde_json::json!({"notAField": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn patch_accepts_allow_listed_fields() {
        let patch: ProfilePatch = serde_json::from_value(serde_json::json!({
            "username": "new_name",
            "givenName": "Ada",
        }))
        .unwrap();
        assert_eq!(patch.username.as_deref(), Some("new_name"));
        assert_eq!(patch.given_name.as_deref(), Some("Ada"));
        assert!(!patch.is_empty());
        assert!(ProfilePatch::default().is_empty());
    }
}
