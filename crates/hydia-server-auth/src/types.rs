// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core identifiers, tenant roles and capabilities.
//!
//! - **ID newtypes**: [`TenantId`] and [`PrincipalId`] wrap UUIDs so a tenant
//!   can never be passed where a principal is expected
//! - **[`Role`]**: the ordered set of tenant roles,
//!   owner > admin > manager > user > viewer
//! - **[`Capability`]**: the fixed permissions each role implies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

/// Declares a UUID-backed identifier with transparent serde and `Display`.
#[macro_export]
macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(
			Debug,
			Clone,
			Copy,
			PartialEq,
			Eq,
			Hash,
			PartialOrd,
			Ord,
			::serde::Serialize,
			::serde::Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(::uuid::Uuid);

		impl $name {
			pub fn new(id: ::uuid::Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(::uuid::Uuid::new_v4())
			}

			pub fn into_inner(self) -> ::uuid::Uuid {
				self.0
			}

			pub fn as_uuid(&self) -> &::uuid::Uuid {
				&self.0
			}
		}

		impl ::std::fmt::Display for $name {
			fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl ::std::str::FromStr for $name {
			type Err = ::uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				::uuid::Uuid::parse_str(s).map(Self)
			}
		}

		impl From<::uuid::Uuid> for $name {
			fn from(id: ::uuid::Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for ::uuid::Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(TenantId, "Unique identifier for a tenant (organization).");
define_id_type!(PrincipalId, "Unique identifier for an authenticated principal.");

// =============================================================================
// Capabilities
// =============================================================================

/// A permission implied by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
	Read,
	Write,
	Delete,
	Share,
	Admin,
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Capability::Read => write!(f, "read"),
			Capability::Write => write!(f, "write"),
			Capability::Delete => write!(f, "delete"),
			Capability::Share => write!(f, "share"),
			Capability::Admin => write!(f, "admin"),
		}
	}
}

// =============================================================================
// Tenant Roles
// =============================================================================

/// Roles within a tenant, most privileged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Full tenant control, including granting ownership.
	Owner,
	/// Manages members and every secret.
	Admin,
	/// Manages secrets, including deleting and sharing them.
	Manager,
	/// Reads and writes secrets.
	User,
	/// Read-only access.
	Viewer,
}

const OWNER_CAPABILITIES: &[Capability] = &[
	Capability::Read,
	Capability::Write,
	Capability::Delete,
	Capability::Share,
	Capability::Admin,
];
const ADMIN_CAPABILITIES: &[Capability] = OWNER_CAPABILITIES;
const MANAGER_CAPABILITIES: &[Capability] = &[
	Capability::Read,
	Capability::Write,
	Capability::Delete,
	Capability::Share,
];
const USER_CAPABILITIES: &[Capability] = &[Capability::Read, Capability::Write];
const VIEWER_CAPABILITIES: &[Capability] = &[Capability::Read];

impl Role {
	/// Returns all roles, most privileged first.
	pub fn all() -> &'static [Role] {
		&[
			Role::Owner,
			Role::Admin,
			Role::Manager,
			Role::User,
			Role::Viewer,
		]
	}

	/// Position in the hierarchy; higher is more privileged.
	pub fn rank(&self) -> u8 {
		match self {
			Role::Owner => 4,
			Role::Admin => 3,
			Role::Manager => 2,
			Role::User => 1,
			Role::Viewer => 0,
		}
	}

	/// Returns true if this role has at least the permissions of the given role.
	pub fn has_permission_of(&self, other: &Role) -> bool {
		self.rank() >= other.rank()
	}

	pub fn capabilities(&self) -> &'static [Capability] {
		match self {
			Role::Owner => OWNER_CAPABILITIES,
			Role::Admin => ADMIN_CAPABILITIES,
			Role::Manager => MANAGER_CAPABILITIES,
			Role::User => USER_CAPABILITIES,
			Role::Viewer => VIEWER_CAPABILITIES,
		}
	}

	pub fn has_capability(&self, capability: Capability) -> bool {
		self.capabilities().contains(&capability)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Owner => "owner",
			Role::Admin => "admin",
			Role::Manager => "manager",
			Role::User => "user",
			Role::Viewer => "viewer",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when a stored role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Role::all()
			.iter()
			.copied()
			.find(|r| r.as_str() == s)
			.ok_or_else(|| UnknownRole(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod id_types {
		use super::*;

		#[test]
		fn tenant_id_serializes_as_uuid() {
			let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
			let json = serde_json::to_string(&TenantId::new(uuid)).unwrap();
			assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
		}

		#[test]
		fn principal_id_parses_from_str() {
			let id = PrincipalId::generate();
			let parsed: PrincipalId = id.to_string().parse().unwrap();
			assert_eq!(parsed, id);
			assert!("not-a-uuid".parse::<PrincipalId>().is_err());
		}

		proptest! {
			#[test]
			fn tenant_id_display_matches_uuid(a: u128) {
				let uuid = Uuid::from_u128(a);
				prop_assert_eq!(TenantId::new(uuid).to_string(), uuid.to_string());
				prop_assert_eq!(Uuid::from(TenantId::new(uuid)), uuid);
			}
		}
	}

	mod roles {
		use super::*;

		#[test]
		fn hierarchy_is_ordered() {
			assert!(Role::Owner.has_permission_of(&Role::Admin));
			assert!(Role::Admin.has_permission_of(&Role::Manager));
			assert!(Role::Manager.has_permission_of(&Role::User));
			assert!(Role::User.has_permission_of(&Role::Viewer));

			assert!(!Role::Admin.has_permission_of(&Role::Owner));
			assert!(!Role::Viewer.has_permission_of(&Role::User));
			assert!(Role::Manager.has_permission_of(&Role::Manager));
		}

		#[test]
		fn all_is_sorted_by_rank() {
			let ranks: Vec<u8> = Role::all().iter().map(Role::rank).collect();
			assert_eq!(ranks, vec![4, 3, 2, 1, 0]);
		}

		#[test]
		fn capabilities_grow_with_rank() {
			for higher in Role::all() {
				for lower in Role::all() {
					if higher.has_permission_of(lower) {
						for cap in lower.capabilities() {
							assert!(
								higher.has_capability(*cap),
								"{higher} should have {cap} because {lower} does"
							);
						}
					}
				}
			}
		}

		#[test]
		fn viewer_is_read_only() {
			assert_eq!(Role::Viewer.capabilities(), &[Capability::Read]);
			assert!(!Role::Viewer.has_capability(Capability::Write));
		}

		#[test]
		fn only_owner_and_admin_administer() {
			let admins: Vec<Role> = Role::all()
				.iter()
				.copied()
				.filter(|r| r.has_capability(Capability::Admin))
				.collect();
			assert_eq!(admins, vec![Role::Owner, Role::Admin]);
		}

		#[test]
		fn display_and_parse_agree() {
			for role in Role::all() {
				assert_eq!(role.to_string().parse::<Role>().unwrap(), *role);
			}
			assert_eq!(
				"superuser".parse::<Role>().unwrap_err(),
				UnknownRole("superuser".to_string())
			);
		}

		#[test]
		fn serializes_snake_case() {
			assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
			let role: Role = serde_json::from_str("\"viewer\"").unwrap();
			assert_eq!(role, Role::Viewer);
		}
	}
}
