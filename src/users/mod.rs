// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Domain
//!
//! Sync from the identity provider plus self-service profile operations.
//! HTTP handlers in `api::users` are thin wrappers over these functions.

pub mod profile;
pub mod sync;

pub use sync::{generate_username, SyncOutcome, SyncProfile};
