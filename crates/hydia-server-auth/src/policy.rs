// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declarative operation → role table.
//!
//! Every gated operation names the roles that may perform it here, in one
//! place. Handlers ask for `Operation::DeleteSecret` rather than carrying
//! their own `[Owner, Admin, Manager]` literal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Capability, Role};

/// An operation that passes through the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
	ReadSecret,
	ListSecrets,
	CreateSecret,
	UpdateSecret,
	DeleteSecret,
	ShareSecret,
	ManageMembers,
}

impl Operation {
	pub fn all() -> &'static [Operation] {
		&[
			Operation::ReadSecret,
			Operation::ListSecrets,
			Operation::CreateSecret,
			Operation::UpdateSecret,
			Operation::DeleteSecret,
			Operation::ShareSecret,
			Operation::ManageMembers,
		]
	}

	/// The capability a role must imply to perform this operation.
	pub fn required_capability(&self) -> Capability {
		match self {
			Operation::ReadSecret | Operation::ListSecrets => Capability::Read,
			Operation::CreateSecret | Operation::UpdateSecret => Capability::Write,
			Operation::DeleteSecret => Capability::Delete,
			Operation::ShareSecret => Capability::Share,
			Operation::ManageMembers => Capability::Admin,
		}
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Operation::ReadSecret => write!(f, "secrets:read"),
			Operation::ListSecrets => write!(f, "secrets:list"),
			Operation::CreateSecret => write!(f, "secrets:create"),
			Operation::UpdateSecret => write!(f, "secrets:update"),
			Operation::DeleteSecret => write!(f, "secrets:delete"),
			Operation::ShareSecret => write!(f, "secrets:share"),
			Operation::ManageMembers => write!(f, "members:manage"),
		}
	}
}

const EVERY_ROLE: &[Role] = &[
	Role::Owner,
	Role::Admin,
	Role::Manager,
	Role::User,
	Role::Viewer,
];
const WRITERS: &[Role] = &[Role::Owner, Role::Admin, Role::Manager, Role::User];
const MANAGERS: &[Role] = &[Role::Owner, Role::Admin, Role::Manager];
const ADMINISTRATORS: &[Role] = &[Role::Owner, Role::Admin];

/// Maps each [`Operation`] to the set of roles allowed to perform it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy;

impl AccessPolicy {
	pub fn acceptable_roles(&self, operation: Operation) -> &'static [Role] {
		match operation {
			Operation::ReadSecret | Operation::ListSecrets => EVERY_ROLE,
			Operation::CreateSecret | Operation::UpdateSecret => WRITERS,
			Operation::DeleteSecret | Operation::ShareSecret => MANAGERS,
			Operation::ManageMembers => ADMINISTRATORS,
		}
	}
}
