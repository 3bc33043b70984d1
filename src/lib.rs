// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Finance API Server
//!
//! Backend API with identity-provider authentication, permission/role
//! authorization, user synchronization and a best-effort audit trail.
//!
//! ## Architecture
//!
//! - [`auth`]: token verification, claim extraction, authorization gates
//! - [`users`]: sync from the identity provider, self-service profile
//! - [`audit`]: bounded queue and background persistence worker
//! - [`storage`]: embedded redb database behind the `UserStore` trait
//! - [`api`]: axum route tree, middleware and OpenAPI document

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod users;

#[cfg(test)]
pub(crate) mod test_util;
