// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization error types.

use thiserror::Error;

use crate::policy::Operation;

/// Errors raised by the permission gate and membership management.
#[derive(Debug, Error)]
pub enum AuthError {
	// =========================================================================
	// Authorization Errors
	// =========================================================================
	/// The principal may not perform the operation in this tenant.
	///
	/// Raised identically for non-members and for members whose role is not
	/// acceptable, so a caller cannot learn which tenants exist.
	#[error("permission denied for {operation}")]
	PermissionDenied { operation: Operation },

	/// Only an owner may grant or revoke the owner role.
	#[error("insufficient role to assign {0}")]
	CannotAssignRole(crate::types::Role),

	// =========================================================================
	// Membership Errors
	// =========================================================================
	#[error("principal is not a member of this tenant")]
	NotMember,

	#[error("cannot remove or demote the last owner of a tenant")]
	LastOwner,

	/// The tenant already has members, so there is no first owner to create.
	#[error("tenant already has members")]
	TenantAlreadyInitialized,

	// =========================================================================
	// Infrastructure Errors
	// =========================================================================
	/// The membership store failed. Distinct from "no membership row".
	#[error("membership lookup failed: {0}")]
	MembershipLookup(String),
}

impl AuthError {
	/// Returns true if this error should be logged at error level.
	pub fn is_internal(&self) -> bool {
		matches!(self, AuthError::MembershipLookup(_))
	}

	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			AuthError::PermissionDenied { .. } | AuthError::CannotAssignRole(_) => 403,
			AuthError::NotMember => 404,
			AuthError::TenantAlreadyInitialized => 409,
			AuthError::LastOwner => 422,
			AuthError::MembershipLookup(_) => 500,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn permission_denied_is_403() {
		let err = AuthError::PermissionDenied {
			operation: Operation::DeleteSecret,
		};
		assert_eq!(err.status_code(), 403);
		assert_eq!(err.to_string(), "permission denied for secrets:delete");
	}

	#[test]
	fn lookup_failure_is_internal_500() {
		let err = AuthError::MembershipLookup("connection reset".into());
		assert_eq!(err.status_code(), 500);
		assert!(err.is_internal());
		assert!(!AuthError::LastOwner.is_internal());
	}

	#[test]
	fn populated_tenant_bootstrap_is_conflict() {
		let err = AuthError::TenantAlreadyInitialized;
		assert_eq!(err.status_code(), 409);
		assert!(!err.is_internal());
	}
}
