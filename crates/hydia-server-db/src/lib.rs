// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # hydia-server-db
//!
//! Persistence layer for Hydia server using SQLite via sqlx.
//!
//! ## Repository Pattern
//!
//! Each domain has two components:
//! - **`*Store` trait**: the interface (`SecretsStore`, or `MembershipStore`
//!   from `hydia-server-auth`)
//! - **`*Repository` struct**: concrete implementation holding a `SqlitePool`
//!
//! Trait impls delegate to inherent methods, which are instrumented with
//! `#[tracing::instrument]`.
//!
//! ## Error Handling
//!
//! | Variant | When to use |
//! |---------|-------------|
//! | `Sqlx` | Let sqlx errors propagate via `?` |
//! | `Internal` | Invalid stored data (e.g., unparseable UUID or role) |
//!
//! Lookups where absence is normal return `Result<Option<T>>`. A failed
//! query is never reported as `None`.
//!
//! ## Testing
//!
//! Tests use a single-connection in-memory SQLite pool with the real
//! migrations applied.

mod error;
pub mod membership;
pub mod pool;
pub mod secret;

#[cfg(test)]
pub mod testing;

pub use error::{DbError, Result};
pub use membership::MembershipRepository;
pub use pool::{create_pool, run_migrations};
pub use secret::{
	CreateSecretParams, SecretRow, SecretsRepository, SecretsStore, UpdateCiphertextParams,
};
