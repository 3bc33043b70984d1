// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication & Authorization Module
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with the identity provider and sends
//!    `Authorization: Bearer <JWT>`
//! 2. [`verifier::TokenVerifier`] checks signature, expiry, issuer and
//!    audience against the provider's JWKS
//! 3. [`claims::Claims`] are extracted from the decoded payload:
//!    - `sub` → subject id (maps to `User.external_id`)
//!    - `{audience}/permissions` → permission set
//!    - configured roles claim → role set
//! 4. Route handlers consult [`gate`] for permission/role decisions
//!
//! The identity provider's sync callback bypasses token auth entirely and
//! is gated by [`secret::ServiceSecretGate`] instead.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod middleware;
pub mod secret;
pub mod verifier;

pub use claims::{Claims, ClaimsConfig};
pub use error::AuthError;
pub use extractor::{Auth, ServiceAuth};
pub use gate::{require_any_role, require_permissions, Decision};
pub use secret::ServiceSecretGate;
pub use verifier::TokenVerifier;
