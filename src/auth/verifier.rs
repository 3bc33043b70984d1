// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! Produces the decoded claim payload the rest of the request pipeline
//! trusts completely. Two modes:
//!
//! - **Production** (JWKS configured): full signature, expiry, issuer and
//!   audience validation against the provider's published keys.
//! - **Development** (no JWKS): structure and expiry validation only. Never
//!   enable outside local development.

use jsonwebtoken::{decode, decode_header, Validation};
use serde_json::Value;

use super::error::AuthError;
use super::jwks::JwksManager;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Decoded token payload, trusted downstream.
pub type ClaimPayload = serde_json::Map<String, Value>;

/// Verifies bearer tokens against the configured identity provider.
#[derive(Clone)]
pub struct TokenVerifier {
    /// JWKS manager; `None` enables the development decode path.
    jwks: Option<JwksManager>,
    issuer: String,
    audience: String,
}

impl TokenVerifier {
    /// Production verifier backed by the provider's JWKS endpoint.
    pub fn new(jwks_url: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            jwks: Some(JwksManager::new(jwks_url)),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Development verifier: no signature check.
    pub fn insecure_dev(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            jwks: None,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// The JWKS manager, when running in production mode.
    pub fn jwks(&self) -> Option<&JwksManager> {
        self.jwks.as_ref()
    }

    /// Verify a bearer token and return its decoded payload.
    pub async fn verify(&self, token: &str) -> Result<ClaimPayload, AuthError> {
        match &self.jwks {
            Some(jwks) => self.verify_production(token, jwks).await,
            None => verify_development(token),
        }
    }

    async fn verify_production(
        &self,
        token: &str,
        jwks: &JwksManager,
    ) -> Result<ClaimPayload, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let (decoding_key, algorithm) = jwks.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<ClaimPayload>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        Ok(token_data.claims)
    }
}

/// Development decode: structure validation only, expiry checked manually.
///
/// WARNING: skips signature verification entirely.
fn verify_development(token: &str) -> Result<ClaimPayload, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<ClaimPayload>(token)
        .map_err(|_| AuthError::MalformedToken)?;

    let payload = token_data.claims;

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| AuthError::InternalError(e.to_string()))?
        .as_secs() as i64;

    if let Some(exp) = payload.get("exp").and_then(Value::as_i64) {
        if exp > 0 && exp < now - CLOCK_SKEW_LEEWAY as i64 {
            return Err(AuthError::TokenExpired);
        }
    }

    Ok(payload)
}
