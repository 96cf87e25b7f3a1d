// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant roles and authorization for Hydia.
//!
//! This crate provides:
//! - Strongly typed tenant and principal identifiers
//! - The five tenant roles and the capabilities each implies
//! - The operation → acceptable-roles table
//! - The permission gate every secret operation passes through
//! - Membership management with owner protection
//!
//! # Security Considerations
//!
//! - A denied request reveals nothing about whether the principal is a member
//! - A failing membership store surfaces as an internal error, never as a deny

pub mod error;
pub mod gate;
pub mod members;
pub mod membership;
pub mod policy;
pub mod types;

pub use error::AuthError;
pub use gate::{PermissionCheck, PermissionGate};
pub use members::MembershipService;
pub use membership::{InMemoryMembershipStore, Membership, MembershipStore};
pub use policy::{AccessPolicy, Operation};
pub use types::{Capability, PrincipalId, Role, TenantId, UnknownRole};
