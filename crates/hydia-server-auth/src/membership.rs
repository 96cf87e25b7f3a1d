// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant membership records and the storage seam the gate reads from.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::AuthError;
use crate::types::{PrincipalId, Role, TenantId};

/// A principal's role within one tenant.
///
/// Keyed by `(tenant_id, principal_id)`: a principal holds at most one role
/// per tenant at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
	pub tenant_id: TenantId,
	pub principal_id: PrincipalId,
	pub role: Role,
	pub created_at: DateTime<Utc>,
}

impl Membership {
	pub fn new(tenant_id: TenantId, principal_id: PrincipalId, role: Role) -> Self {
		Self {
			tenant_id,
			principal_id,
			role,
			created_at: Utc::now(),
		}
	}
}

/// Storage operations for tenant memberships.
///
/// `Ok(None)` means "no membership row"; `Err` means the lookup itself
/// failed. Implementations must keep the two apart.
#[async_trait]
pub trait MembershipStore: Send + Sync {
	async fn get_membership(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<Option<Membership>, AuthError>;

	/// Insert the membership, replacing any existing role for the pair.
	async fn upsert_membership(&self, membership: &Membership) -> Result<(), AuthError>;

	/// Returns true if a row was removed.
	async fn remove_membership(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<bool, AuthError>;

	async fn count_role(&self, tenant_id: TenantId, role: Role) -> Result<u64, AuthError>;

	async fn list_members(&self, tenant_id: TenantId) -> Result<Vec<Membership>, AuthError>;

	/// Insert `membership` only if the tenant has no members yet. Returns
	/// false, writing nothing, if the tenant is already populated.
	async fn insert_first_member(&self, membership: &Membership) -> Result<bool, AuthError>;

	/// Remove an owner only while another owner remains. The owner count and
	/// the delete are a single step. Returns false, writing nothing, if the
	/// principal is not an owner or is the last one.
	async fn remove_owner_unless_last(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<bool, AuthError>;

	/// Give an owner the lesser `role` only while another owner remains. Same
	/// atomicity and return contract as [`Self::remove_owner_unless_last`].
	async fn demote_owner_unless_last(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		role: Role,
	) -> Result<bool, AuthError>;
}

/// Process-local membership store for tests and single-node development.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
	rows: RwLock<HashMap<(TenantId, PrincipalId), Membership>>,
}

impl InMemoryMembershipStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
	async fn get_membership(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<Option<Membership>, AuthError> {
		Ok(self.rows.read().await.get(&(tenant_id, principal_id)).cloned())
	}

	async fn upsert_membership(&self, membership: &Membership) -> Result<(), AuthError> {
		let mut rows = self.rows.write().await;
		let key = (membership.tenant_id, membership.principal_id);
		match rows.get_mut(&key) {
			Some(existing) => existing.role = membership.role,
			None => {
				rows.insert(key, membership.clone());
			}
		}
		debug!(
			tenant_id = %membership.tenant_id,
			principal_id = %membership.principal_id,
			role = %membership.role,
			"membership stored"
		);
		Ok(())
	}

	async fn remove_membership(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<bool, AuthError> {
		Ok(self
			.rows
			.write()
			.await
			.remove(&(tenant_id, principal_id))
			.is_some())
	}

	async fn count_role(&self, tenant_id: TenantId, role: Role) -> Result<u64, AuthError> {
		Ok(self
			.rows
			.read()
			.await
			.values()
			.filter(|m| m.tenant_id == tenant_id && m.role == role)
			.count() as u64)
	}

	async fn list_members(&self, tenant_id: TenantId) -> Result<Vec<Membership>, AuthError> {
		let mut members: Vec<Membership> = self
			.rows
			.read()
			.await
			.values()
			.filter(|m| m.tenant_id == tenant_id)
			.cloned()
			.collect();
		members.sort_by(|a, b| {
			b.role
				.rank()
				.cmp(&a.role.rank())
				.then(a.created_at.cmp(&b.created_at))
		});
		Ok(members)
	}

	async fn insert_first_member(&self, membership: &Membership) -> Result<bool, AuthError> {
		let mut rows = self.rows.write().await;
		if rows.keys().any(|(tenant_id, _)| *tenant_id == membership.tenant_id) {
			return Ok(false);
		}
		rows.insert(
			(membership.tenant_id, membership.principal_id),
			membership.clone(),
		);
		Ok(true)
	}

	async fn remove_owner_unless_last(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<bool, AuthError> {
		let mut rows = self.rows.write().await;
		if !owner_may_leave(&rows, tenant_id, principal_id) {
			return Ok(false);
		}
		Ok(rows.remove(&(tenant_id, principal_id)).is_some())
	}

	async fn demote_owner_unless_last(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		role: Role,
	) -> Result<bool, AuthError> {
		let mut rows = self.rows.write().await;
		if !owner_may_leave(&rows, tenant_id, principal_id) {
			return Ok(false);
		}
		match rows.get_mut(&(tenant_id, principal_id)) {
			Some(existing) => {
				existing.role = role;
				Ok(true)
			}
			None => Ok(false),
		}
	}
}

/// True if `principal_id` is an owner of the tenant and not the only one.
fn owner_may_leave(
	rows: &HashMap<(TenantId, PrincipalId), Membership>,
	tenant_id: TenantId,
	principal_id: PrincipalId,
) -> bool {
	let is_owner = rows
		.get(&(tenant_id, principal_id))
		.is_some_and(|m| m.role == Role::Owner);
	let owners = rows
		.values()
		.filter(|m| m.tenant_id == tenant_id && m.role == Role::Owner)
		.count();
	is_owner && owners > 1
}
