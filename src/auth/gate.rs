// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization decisions over extracted claims.
//!
//! Permission checks require ALL listed scopes (least-privilege composition
//! of fine-grained capabilities); role checks require ANY match (broad
//! administrative gating). The asymmetry is intentional.
//!
//! Both checks are pure decision functions: they return [`Decision`]
//! instead of erroring, and callers map `Deny` to a transport response.

use super::claims::Claims;

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn deny(reason: impl Into<String>) -> Self {
        Decision::Deny {
            reason: reason.into(),
        }
    }
}

/// Allow iff every required permission is present in the claims.
///
/// Missing or empty claim data denies; it never errors.
pub fn require_permissions(claims: &Claims, required: &[&str]) -> Decision {
    let missing: Vec<&str> = required
        .iter()
        .filter(|permission| !claims.has_permission(permission))
        .copied()
        .collect();

    if missing.is_empty() {
        Decision::Allow
    } else {
        Decision::deny(format!("missing permissions: {}", missing.join(", ")))
    }
}

/// Allow iff at least one required role is present in the claims.
pub fn require_any_role(claims: &Claims, required: &[&str]) -> Decision {
    if required.iter().any(|role| claims.has_role(role)) {
        Decision::Allow
    } else {
        Decision::deny(format!("requires one of roles: {}", required.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn claims(permissions: &[&str], roles: &[&str]) -> Claims {
        Claims {
            subject_id: "auth0|user1".to_string(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
            roles: roles.iter().map(|s| s.to_string()).collect(),
            extra: HashMap::new(),
        }
    }

    #[test]
    fn all_permissions_present_allows() {
        let claims = claims(&["read:accounts", "write:transactions"], &[]);
        assert!(require_permissions(&claims, &["read:accounts", "write:transactions"]).is_allow());
    }

    #[test]
    fn one_missing_permission_denies() {
        let claims = claims(&["read:accounts"], &[]);
        let decision = require_permissions(&claims, &["read:accounts", "write:transactions"]);
        match decision {
            Decision::Deny { reason } => assert!(reason.contains("write:transactions")),
            Decision::Allow => panic!("expected deny"),
        }
    }

    #[test]
    fn empty_claims_deny_rather_than_error() {
        let empty = Claims {
            subject_id: "auth0|user1".to_string(),
            permissions: HashSet::new(),
            roles: HashSet::new(),
            extra: HashMap::new(),
        };
        assert!(!require_permissions(&empty, &["read:accounts"]).is_allow());
        assert!(!require_any_role(&empty, &["admin"]).is_allow());
    }

    #[test]
    fn no_required_permissions_allows() {
        let claims = claims(&[], &[]);
        assert!(require_permissions(&claims, &[]).is_allow());
    }

    #[test]
    fn any_role_match_allows() {
        let claims = claims(&[], &["support"]);
        assert!(require_any_role(&claims, &["admin", "support"]).is_allow());
    }

    #[test]
    fn no_role_overlap_denies() {
        let claims = claims(&[], &["client"]);
        let decision = require_any_role(&claims, &["admin", "auditor"]);
        assert!(!decision.is_allow());
    }

    #[test]
    fn superset_of_required_permissions_allows() {
        let claims = claims(&["a", "b", "c"], &[]);
        assert!(require_permissions(&claims, &["a", "b"]).is_allow());
    }
}
