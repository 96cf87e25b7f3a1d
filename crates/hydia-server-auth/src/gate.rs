// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The permission gate: the single authorization checkpoint in front of every
//! secret operation.
//!
//! A check is a pure set-membership test. The gate looks up the principal's
//! role in the tenant and reports whether that role is in the acceptable set
//! supplied by the caller. No precedence between roles is applied here; the
//! [`AccessPolicy`] table decides which roles are enough for an operation.
//!
//! ```text
//! authorize(tenant, principal, op)
//!     │
//!     ├── policy.acceptable_roles(op)
//!     ├── memberships.get_membership(tenant, principal)
//!     │       ├── Err  → AuthError::MembershipLookup (never a silent deny)
//!     │       ├── None → { allowed: false, role: None }
//!     │       └── Some → { allowed: role ∈ acceptable, role }
//!     └── allowed == false → AuthError::PermissionDenied
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::AuthError;
use crate::membership::MembershipStore;
use crate::policy::{AccessPolicy, Operation};
use crate::types::{PrincipalId, Role, TenantId};

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheck {
	pub allowed: bool,
	/// The principal's role in the tenant, if it is a member at all.
	pub role: Option<Role>,
}

impl PermissionCheck {
	pub fn denied_non_member() -> Self {
		Self {
			allowed: false,
			role: None,
		}
	}
}

/// Decides allow/deny from a principal's role within a tenant.
pub struct PermissionGate<M: MembershipStore> {
	memberships: Arc<M>,
	policy: AccessPolicy,
}

impl<M: MembershipStore> Clone for PermissionGate<M> {
	fn clone(&self) -> Self {
		Self {
			memberships: Arc::clone(&self.memberships),
			policy: self.policy,
		}
	}
}

impl<M: MembershipStore> PermissionGate<M> {
	pub fn new(memberships: Arc<M>) -> Self {
		Self::with_policy(memberships, AccessPolicy)
	}

	pub fn with_policy(memberships: Arc<M>, policy: AccessPolicy) -> Self {
		Self {
			memberships,
			policy,
		}
	}

	pub fn policy(&self) -> &AccessPolicy {
		&self.policy
	}

	pub fn memberships(&self) -> &Arc<M> {
		&self.memberships
	}

	/// Check whether the principal holds one of `acceptable_roles` in `tenant_id`.
	///
	/// # Errors
	/// `AuthError::MembershipLookup` if the store fails. A missing membership
	/// is not an error; it yields `allowed: false, role: None`.
	#[instrument(level = "debug", skip_all, fields(tenant_id = %tenant_id, principal_id = %principal_id))]
	pub async fn check_permission(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		acceptable_roles: &[Role],
	) -> Result<PermissionCheck, AuthError> {
		let membership = self
			.memberships
			.get_membership(tenant_id, principal_id)
			.await?;

		let check = match membership {
			None => PermissionCheck::denied_non_member(),
			Some(m) => PermissionCheck {
				allowed: acceptable_roles.contains(&m.role),
				role: Some(m.role),
			},
		};

		debug!(allowed = check.allowed, role = ?check.role, "permission evaluated");
		Ok(check)
	}

	/// Check an operation against the policy table without failing on deny.
	pub async fn check_operation(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		operation: Operation,
	) -> Result<PermissionCheck, AuthError> {
		let acceptable = self.policy.acceptable_roles(operation);
		self
			.check_permission(tenant_id, principal_id, acceptable)
			.await
	}

	/// Require that the principal may perform `operation`, returning its role.
	///
	/// Non-members and under-privileged members get the same
	/// `PermissionDenied` error; the actual role is only logged.
	#[instrument(skip_all, fields(tenant_id = %tenant_id, principal_id = %principal_id, operation = %operation))]
	pub async fn authorize(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		operation: Operation,
	) -> Result<Role, AuthError> {
		let check = self
			.check_operation(tenant_id, principal_id, operation)
			.await?;

		match check {
			PermissionCheck {
				allowed: true,
				role: Some(role),
			} => Ok(role),
			PermissionCheck { role, .. } => {
				warn!(role = ?role, "permission denied");
				Err(AuthError::PermissionDenied { operation })
			}
		}
	}
}
