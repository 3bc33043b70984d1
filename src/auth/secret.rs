// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret gate for trusted service-to-service calls.
//!
//! The identity provider's post-login action pushes sync events to
//! `POST /users/sync` authenticated with a shared secret instead of a user
//! token. The gate is independent of and mutually exclusive with bearer
//! token verification.

use super::gate::Decision;

/// Validates the shared-secret credential presented by a trusted service.
#[derive(Debug, Clone)]
pub struct ServiceSecretGate {
    secret: String,
}

/// Construction error: an unset secret must refuse to start the process.
#[derive(Debug, thiserror::Error)]
#[error("service secret must not be empty")]
pub struct EmptySecret;

impl ServiceSecretGate {
    /// Build the gate. Rejects empty secrets so the process fails at
    /// startup rather than running with an always-deny (or worse,
    /// always-allow) credential.
    pub fn new(secret: impl Into<String>) -> Result<Self, EmptySecret> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(EmptySecret);
        }
        Ok(Self { secret })
    }

    /// Exact-equality check of the presented credential.
    ///
    /// Absent or mismatched secrets always deny.
    pub fn verify(&self, presented: Option<&str>) -> Decision {
        match presented {
            Some(candidate) if candidate == self.secret => Decision::Allow,
            Some(_) => Decision::Deny {
                reason: "service secret mismatch".to_string(),
            },
            None => Decision::Deny {
                reason: "service secret missing".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_refused_at_construction() {
        assert!(ServiceSecretGate::new("").is_err());
        assert!(ServiceSecretGate::new("   ").is_err());
    }

    #[test]
    fn matching_secret_allows() {
        let gate = ServiceSecretGate::new("s3cret").unwrap();
        assert!(gate.verify(Some("s3cret")).is_allow());
    }

    #[test]
    fn missing_secret_denies() {
        let gate = ServiceSecretGate::new("s3cret").unwrap();
        assert!(!gate.verify(None).is_allow());
    }

    #[test]
    fn wrong_secret_denies() {
        let gate = ServiceSecretGate::new("s3cret").unwrap();
        assert!(!gate.verify(Some("incorrect-secret")).is_allow());
        // Prefix/suffix variants must not pass an exact-equality check.
        assert!(!gate.verify(Some("s3cret ")).is_allow());
        assert!(!gate.verify(Some("s3cre")).is_allow());
    }
}
