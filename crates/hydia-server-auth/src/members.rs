// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant membership management.
//!
//! Every change passes the gate with [`Operation::ManageMembers`]. On top of
//! that:
//! - an actor may only grant or revoke roles up to its own, so only an
//!   owner touches the owner role
//! - a tenant always keeps at least one owner

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::AuthError;
use crate::gate::PermissionGate;
use crate::membership::{Membership, MembershipStore};
use crate::policy::Operation;
use crate::types::{PrincipalId, Role, TenantId};

pub struct MembershipService<M: MembershipStore> {
	gate: PermissionGate<M>,
	store: Arc<M>,
}

impl<M: MembershipStore> MembershipService<M> {
	pub fn new(store: Arc<M>) -> Self {
		Self {
			gate: PermissionGate::new(Arc::clone(&store)),
			store,
		}
	}

	pub fn gate(&self) -> &PermissionGate<M> {
		&self.gate
	}

	/// Make `principal_id` the first owner of a new tenant.
	///
	/// Not gated, so it only succeeds while the tenant has no members at all.
	#[instrument(skip(self))]
	pub async fn bootstrap_owner(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<Membership, AuthError> {
		let membership = Membership::new(tenant_id, principal_id, Role::Owner);
		if !self.store.insert_first_member(&membership).await? {
			warn!(tenant_id = %tenant_id, principal_id = %principal_id, "bootstrap refused: tenant already has members");
			return Err(AuthError::TenantAlreadyInitialized);
		}
		info!(tenant_id = %tenant_id, principal_id = %principal_id, "tenant owner bootstrapped");
		Ok(membership)
	}

	/// Add a member, or change the role of an existing one.
	#[instrument(skip(self))]
	pub async fn add_member(
		&self,
		tenant_id: TenantId,
		actor_id: PrincipalId,
		principal_id: PrincipalId,
		role: Role,
	) -> Result<Membership, AuthError> {
		let actor_role = self
			.gate
			.authorize(tenant_id, actor_id, Operation::ManageMembers)
			.await?;
		ensure_can_assign(actor_role, role)?;

		let existing = self.store.get_membership(tenant_id, principal_id).await?;
		let demotes_owner = match &existing {
			Some(current) => {
				ensure_can_assign(actor_role, current.role)?;
				current.role == Role::Owner && role != Role::Owner
			}
			None => false,
		};

		let membership = match existing {
			Some(mut current) => {
				current.role = role;
				current
			}
			None => Membership::new(tenant_id, principal_id, role),
		};
		if demotes_owner {
			if !self
				.store
				.demote_owner_unless_last(tenant_id, principal_id, role)
				.await?
			{
				return Err(AuthError::LastOwner);
			}
		} else {
			self.store.upsert_membership(&membership).await?;
		}

		info!(
			tenant_id = %tenant_id,
			principal_id = %principal_id,
			role = %role,
			"membership updated"
		);
		Ok(membership)
	}

	/// Change the role of an existing member.
	pub async fn change_role(
		&self,
		tenant_id: TenantId,
		actor_id: PrincipalId,
		principal_id: PrincipalId,
		role: Role,
	) -> Result<Membership, AuthError> {
		self
			.gate
			.authorize(tenant_id, actor_id, Operation::ManageMembers)
			.await?;
		if self
			.store
			.get_membership(tenant_id, principal_id)
			.await?
			.is_none()
		{
			return Err(AuthError::NotMember);
		}
		self.add_member(tenant_id, actor_id, principal_id, role).await
	}

	#[instrument(skip(self))]
	pub async fn remove_member(
		&self,
		tenant_id: TenantId,
		actor_id: PrincipalId,
		principal_id: PrincipalId,
	) -> Result<(), AuthError> {
		let actor_role = self
			.gate
			.authorize(tenant_id, actor_id, Operation::ManageMembers)
			.await?;

		let current = self
			.store
			.get_membership(tenant_id, principal_id)
			.await?
			.ok_or(AuthError::NotMember)?;
		ensure_can_assign(actor_role, current.role)?;
		if current.role == Role::Owner {
			if !self
				.store
				.remove_owner_unless_last(tenant_id, principal_id)
				.await?
			{
				return Err(AuthError::LastOwner);
			}
		} else {
			self.store.remove_membership(tenant_id, principal_id).await?;
		}
		info!(tenant_id = %tenant_id, principal_id = %principal_id, "member removed");
		Ok(())
	}

	/// The principal's role in the tenant, if any.
	pub async fn role_of(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<Option<Role>, AuthError> {
		Ok(self
			.store
			.get_membership(tenant_id, principal_id)
			.await?
			.map(|m| m.role))
	}

	pub async fn list_members(
		&self,
		tenant_id: TenantId,
		actor_id: PrincipalId,
	) -> Result<Vec<Membership>, AuthError> {
		self
			.gate
			.authorize(tenant_id, actor_id, Operation::ManageMembers)
			.await?;
		self.store.list_members(tenant_id).await
	}
}

fn ensure_can_assign(actor_role: Role, target: Role) -> Result<(), AuthError> {
	if !actor_role.has_permission_of(&target) {
		return Err(AuthError::CannotAssignRole(target));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::membership::InMemoryMembershipStore;

	async fn tenant_with_owner() -> (
		MembershipService<InMemoryMembershipStore>,
		TenantId,
		PrincipalId,
	) {
		let service = MembershipService::new(Arc::new(InMemoryMembershipStore::new()));
		let tenant = TenantId::generate();
		let owner = PrincipalId::generate();
		service.bootstrap_owner(tenant, owner).await.unwrap();
		(service, tenant, owner)
	}

	#[tokio::test]
	async fn owner_adds_and_promotes_member() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let member = PrincipalId::generate();

		service
			.add_member(tenant, owner, member, Role::Viewer)
			.await
			.unwrap();
		service
			.change_role(tenant, owner, member, Role::Manager)
			.await
			.unwrap();

		assert_eq!(
			service.role_of(tenant, member).await.unwrap(),
			Some(Role::Manager)
		);
		assert_eq!(service.list_members(tenant, owner).await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn admin_cannot_grant_owner() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let admin = PrincipalId::generate();
		service
			.add_member(tenant, owner, admin, Role::Admin)
			.await
			.unwrap();

		let err = service
			.add_member(tenant, admin, PrincipalId::generate(), Role::Owner)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::CannotAssignRole(Role::Owner)));
	}

	#[tokio::test]
	async fn admin_cannot_remove_owner() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let admin = PrincipalId::generate();
		service
			.add_member(tenant, owner, admin, Role::Admin)
			.await
			.unwrap();

		let err = service.remove_member(tenant, admin, owner).await.unwrap_err();
		assert!(matches!(err, AuthError::CannotAssignRole(Role::Owner)));
	}

	#[tokio::test]
	async fn user_cannot_manage_members() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let user = PrincipalId::generate();
		service
			.add_member(tenant, owner, user, Role::User)
			.await
			.unwrap();

		let err = service
			.add_member(tenant, user, PrincipalId::generate(), Role::Viewer)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::PermissionDenied { .. }));
	}

	#[tokio::test]
	async fn last_owner_cannot_leave_or_be_demoted() {
		let (service, tenant, owner) = tenant_with_owner().await;

		let err = service.remove_member(tenant, owner, owner).await.unwrap_err();
		assert!(matches!(err, AuthError::LastOwner));

		let err = service
			.change_role(tenant, owner, owner, Role::Admin)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::LastOwner));
	}

	#[tokio::test]
	async fn bootstrap_on_populated_tenant_is_rejected() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let viewer = PrincipalId::generate();
		service
			.add_member(tenant, owner, viewer, Role::Viewer)
			.await
			.unwrap();

		let err = service.bootstrap_owner(tenant, viewer).await.unwrap_err();
		assert!(matches!(err, AuthError::TenantAlreadyInitialized));
		let err = service
			.bootstrap_owner(tenant, PrincipalId::generate())
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::TenantAlreadyInitialized));

		assert_eq!(service.role_of(tenant, viewer).await.unwrap(), Some(Role::Viewer));
		assert_eq!(service.list_members(tenant, owner).await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn concurrent_owners_cannot_both_step_down() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let co_owner = PrincipalId::generate();
		service
			.add_member(tenant, owner, co_owner, Role::Owner)
			.await
			.unwrap();

		let (a, b) = tokio::join!(
			service.remove_member(tenant, owner, owner),
			service.remove_member(tenant, co_owner, co_owner),
		);
		let (survivor, err) = match (a, b) {
			(Ok(()), Err(err)) => (co_owner, err),
			(Err(err), Ok(())) => (owner, err),
			other => panic!("exactly one owner should leave, got {other:?}"),
		};
		assert!(matches!(err, AuthError::LastOwner));
		assert_eq!(service.role_of(tenant, survivor).await.unwrap(), Some(Role::Owner));
	}

	#[tokio::test]
	async fn second_owner_allows_first_to_step_down() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let co_owner = PrincipalId::generate();
		service
			.add_member(tenant, owner, co_owner, Role::Owner)
			.await
			.unwrap();

		service
			.change_role(tenant, co_owner, owner, Role::Admin)
			.await
			.unwrap();
		assert_eq!(service.role_of(tenant, owner).await.unwrap(), Some(Role::Admin));
	}

	#[tokio::test]
	async fn change_role_of_non_member_is_not_found() {
		let (service, tenant, owner) = tenant_with_owner().await;
		let err = service
			.change_role(tenant, owner, PrincipalId::generate(), Role::User)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::NotMember));
	}
}
