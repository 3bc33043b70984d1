// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim extraction from verified token payloads.
//!
//! Identity-provider tokens carry standard OIDC claims plus custom claims
//! under namespaced keys: permissions at `{audience}/permissions`, roles at
//! a configurable key (default `{audience}/roles`). The payload arrives as
//! a decoded JSON map from the token verifier; extraction is a pure
//! transform of that map.
//!
//! A namespaced claim that is present but not an array of strings degrades
//! to the empty set rather than erroring, so that a provider-side claim
//! shape drift denies access without crashing the request pipeline.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::error::AuthError;

/// Claim keys the extractor looks for.
#[derive(Debug, Clone)]
pub struct ClaimsConfig {
    /// Namespaced permissions key, e.g. `https://api.example.com/permissions`.
    pub permissions_claim: String,
    /// Roles key, e.g. `https://api.example.com/roles`.
    pub roles_claim: String,
}

/// Trusted attributes of a verified token, scoped to one request.
///
/// Never persisted; `subject_id` maps to `User.external_id` in storage.
#[derive(Debug, Clone)]
pub struct Claims {
    /// Token subject: the canonical identity-provider user id.
    pub subject_id: String,
    /// Fine-grained permission scopes granted to the subject.
    pub permissions: HashSet<String>,
    /// Coarse roles assigned to the subject.
    pub roles: HashSet<String>,
    /// Remaining custom claims, passed through untyped.
    pub extra: HashMap<String, Value>,
}

impl Claims {
    /// Extract claims from a verified, decoded token payload.
    ///
    /// `sub` is required and must be a non-empty string; everything else
    /// defaults to empty when missing or malformed.
    pub fn extract(
        payload: &serde_json::Map<String, Value>,
        config: &ClaimsConfig,
    ) -> Result<Self, AuthError> {
        let subject_id = match payload.get("sub") {
            Some(Value::String(sub)) if !sub.is_empty() => sub.clone(),
            Some(_) => {
                return Err(AuthError::MalformedClaims(
                    "sub claim is not a string".to_string(),
                ))
            }
            None => {
                return Err(AuthError::MalformedClaims(
                    "sub claim is missing".to_string(),
                ))
            }
        };

        let permissions = string_set(payload.get(&config.permissions_claim));
        let roles = string_set(payload.get(&config.roles_claim));

        let extra = payload
            .iter()
            .filter(|(key, _)| {
                key.as_str() != "sub"
                    && key.as_str() != config.permissions_claim
                    && key.as_str() != config.roles_claim
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            subject_id,
            permissions,
            roles,
            extra,
        })
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Read a claim value as a set of strings.
///
/// Non-array values and non-string elements are ignored: the claim
/// degrades to empty, authorization stays fail-closed.
fn string_set(value: Option<&Value>) -> HashSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => HashSet::new(),
    }
}
