// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant membership repository.
//!
//! Backs the permission gate: one row per `(tenant_id, principal_id)` holding
//! the principal's role in that tenant.

use async_trait::async_trait;
use chrono::Utc;
use hydia_server_auth::{AuthError, Membership, MembershipStore, PrincipalId, Role, TenantId};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;

/// Repository for tenant membership database operations.
///
/// All IDs are UUIDs stored as strings in SQLite.
#[derive(Clone)]
pub struct MembershipRepository {
	pool: SqlitePool,
}

impl MembershipRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Get a principal's membership in a tenant.
	///
	/// # Returns
	/// `None` if the principal is not a member.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id, principal_id = %principal_id))]
	pub async fn get_membership(
		&self,
		tenant_id: &TenantId,
		principal_id: &PrincipalId,
	) -> Result<Option<Membership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT tenant_id, principal_id, role, created_at
			FROM tenant_memberships
			WHERE tenant_id = ? AND principal_id = ?
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(principal_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_membership(&r)).transpose()
	}

	/// Insert a membership or replace the role of an existing one.
	///
	/// `created_at` of an existing row is preserved.
	#[tracing::instrument(skip(self, membership), fields(tenant_id = %membership.tenant_id, principal_id = %membership.principal_id, role = %membership.role))]
	pub async fn upsert_membership(&self, membership: &Membership) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO tenant_memberships (tenant_id, principal_id, role, created_at)
			VALUES (?, ?, ?, ?)
			ON CONFLICT(tenant_id, principal_id) DO UPDATE SET role = excluded.role
			"#,
		)
		.bind(membership.tenant_id.to_string())
		.bind(membership.principal_id.to_string())
		.bind(membership.role.as_str())
		.bind(membership.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(
			tenant_id = %membership.tenant_id,
			principal_id = %membership.principal_id,
			role = %membership.role,
			"membership stored"
		);
		Ok(())
	}

	/// Remove a principal from a tenant.
	///
	/// # Returns
	/// `true` if a membership was removed, `false` if not found.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id, principal_id = %principal_id))]
	pub async fn remove_membership(
		&self,
		tenant_id: &TenantId,
		principal_id: &PrincipalId,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM tenant_memberships
			WHERE tenant_id = ? AND principal_id = ?
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(principal_id.to_string())
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected() > 0;
		if removed {
			tracing::debug!(tenant_id = %tenant_id, principal_id = %principal_id, "member removed from tenant");
		}
		Ok(removed)
	}

	/// Count members of a tenant holding `role`.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id, role = %role))]
	pub async fn count_role(&self, tenant_id: &TenantId, role: Role) -> Result<i64, DbError> {
		let row: (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*) FROM tenant_memberships
			WHERE tenant_id = ? AND role = ?
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(role.as_str())
		.fetch_one(&self.pool)
		.await?;

		Ok(row.0)
	}

	/// List the members of a tenant, strongest role first, then by join date.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
	pub async fn list_members(&self, tenant_id: &TenantId) -> Result<Vec<Membership>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT tenant_id, principal_id, role, created_at
			FROM tenant_memberships
			WHERE tenant_id = ?
			ORDER BY created_at ASC
			"#,
		)
		.bind(tenant_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut members = rows
			.iter()
			.map(row_to_membership)
			.collect::<Result<Vec<_>, _>>()?;
		members.sort_by(|a, b| b.role.rank().cmp(&a.role.rank()));

		tracing::debug!(tenant_id = %tenant_id, count = members.len(), "listed tenant members");
		Ok(members)
	}

	/// Insert a membership only if the tenant has no rows yet.
	///
	/// # Returns
	/// `false` if the tenant already had members and nothing was written.
	#[tracing::instrument(skip(self, membership), fields(tenant_id = %membership.tenant_id, principal_id = %membership.principal_id))]
	pub async fn insert_first_member(&self, membership: &Membership) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			INSERT INTO tenant_memberships (tenant_id, principal_id, role, created_at)
			SELECT ?, ?, ?, ?
			WHERE NOT EXISTS (SELECT 1 FROM tenant_memberships WHERE tenant_id = ?)
			"#,
		)
		.bind(membership.tenant_id.to_string())
		.bind(membership.principal_id.to_string())
		.bind(membership.role.as_str())
		.bind(membership.created_at.to_rfc3339())
		.bind(membership.tenant_id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Delete an owner row while at least one other owner remains.
	///
	/// The owner count is a subquery of the `DELETE`, so a concurrent removal
	/// cannot leave the tenant without an owner.
	///
	/// # Returns
	/// `false` if the principal is not an owner or is the last one.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id, principal_id = %principal_id))]
	pub async fn remove_owner_unless_last(
		&self,
		tenant_id: &TenantId,
		principal_id: &PrincipalId,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM tenant_memberships
			WHERE tenant_id = ? AND principal_id = ? AND role = ?
			  AND (SELECT COUNT(*) FROM tenant_memberships WHERE tenant_id = ? AND role = ?) > 1
			"#,
		)
		.bind(tenant_id.to_string())
		.bind(principal_id.to_string())
		.bind(Role::Owner.as_str())
		.bind(tenant_id.to_string())
		.bind(Role::Owner.as_str())
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected() > 0;
		if removed {
			tracing::debug!(tenant_id = %tenant_id, principal_id = %principal_id, "owner removed from tenant");
		}
		Ok(removed)
	}

	/// Move an owner to `role` while at least one other owner remains.
	///
	/// # Returns
	/// `false` if the principal is not an owner or is the last one.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id, principal_id = %principal_id, role = %role))]
	pub async fn demote_owner_unless_last(
		&self,
		tenant_id: &TenantId,
		principal_id: &PrincipalId,
		role: Role,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE tenant_memberships SET role = ?
			WHERE tenant_id = ? AND principal_id = ? AND role = ?
			  AND (SELECT COUNT(*) FROM tenant_memberships WHERE tenant_id = ? AND role = ?) > 1
			"#,
		)
		.bind(role.as_str())
		.bind(tenant_id.to_string())
		.bind(principal_id.to_string())
		.bind(Role::Owner.as_str())
		.bind(tenant_id.to_string())
		.bind(Role::Owner.as_str())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
impl MembershipStore for MembershipRepository {
	async fn get_membership(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<Option<Membership>, AuthError> {
		Ok(MembershipRepository::get_membership(self, &tenant_id, &principal_id).await?)
	}

	async fn upsert_membership(&self, membership: &Membership) -> Result<(), AuthError> {
		Ok(MembershipRepository::upsert_membership(self, membership).await?)
	}

	async fn remove_membership(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<bool, AuthError> {
		Ok(MembershipRepository::remove_membership(self, &tenant_id, &principal_id).await?)
	}

	async fn count_role(&self, tenant_id: TenantId, role: Role) -> Result<u64, AuthError> {
		let count = MembershipRepository::count_role(self, &tenant_id, role).await?;
		Ok(count.max(0) as u64)
	}

	async fn list_members(&self, tenant_id: TenantId) -> Result<Vec<Membership>, AuthError> {
		Ok(MembershipRepository::list_members(self, &tenant_id).await?)
	}

	async fn insert_first_member(&self, membership: &Membership) -> Result<bool, AuthError> {
		Ok(MembershipRepository::insert_first_member(self, membership).await?)
	}

	async fn remove_owner_unless_last(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> Result<bool, AuthError> {
		Ok(MembershipRepository::remove_owner_unless_last(self, &tenant_id, &principal_id).await?)
	}

	async fn demote_owner_unless_last(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		role: Role,
	) -> Result<bool, AuthError> {
		Ok(
			MembershipRepository::demote_owner_unless_last(self, &tenant_id, &principal_id, role)
				.await?,
		)
	}
}

fn row_to_membership(row: &sqlx::sqlite::SqliteRow) -> Result<Membership, DbError> {
	let tenant_id_str: String = row.get("tenant_id");
	let principal_id_str: String = row.get("principal_id");
	let role_str: String = row.get("role");
	let created_at: String = row.get("created_at");

	let tenant_id = Uuid::parse_str(&tenant_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid tenant_id: {e}")))?;
	let principal_id = Uuid::parse_str(&principal_id_str)
		.map_err(|e| DbError::Internal(format!("Invalid principal_id: {e}")))?;
	let role: Role = role_str
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid role: {e}")))?;

	Ok(Membership {
		tenant_id: TenantId::new(tenant_id),
		principal_id: PrincipalId::new(principal_id),
		role,
		created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("Invalid created_at: {e}")))?
			.with_timezone(&Utc),
	})
}
