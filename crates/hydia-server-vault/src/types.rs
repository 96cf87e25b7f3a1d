// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret records and the values that flow in and out of the vault service.

use chrono::{DateTime, Utc};
use hydia_common_secret::SecretString;
use hydia_server_auth::{PrincipalId, TenantId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cipher::Ciphertext;

hydia_server_auth::define_id_type!(SecretId, "Unique identifier for a stored secret.");

/// What a stored secret holds. Only affects presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretKind {
	#[default]
	Password,
	Note,
}

impl SecretKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			SecretKind::Password => "password",
			SecretKind::Note => "note",
		}
	}
}

impl fmt::Display for SecretKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SecretKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"password" => Ok(SecretKind::Password),
			"note" => Ok(SecretKind::Note),
			other => Err(format!("unknown secret kind: {other}")),
		}
	}
}

/// A secret as the store holds it. The value is only ever ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
	pub id: SecretId,
	pub tenant_id: TenantId,
	pub name: String,
	pub kind: SecretKind,
	pub ciphertext: Ciphertext,
	pub created_by: PrincipalId,
	pub updated_by: PrincipalId,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A record about to be persisted. The store assigns the ID and timestamps.
#[derive(Debug, Clone)]
pub struct NewSecret {
	pub tenant_id: TenantId,
	pub name: String,
	pub kind: SecretKind,
	pub ciphertext: Ciphertext,
	pub created_by: PrincipalId,
}

/// Everything about a secret except its value. Safe to list and log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMetadata {
	pub id: SecretId,
	pub tenant_id: TenantId,
	pub name: String,
	pub kind: SecretKind,
	pub created_by: PrincipalId,
	pub updated_by: PrincipalId,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<&SecretRecord> for SecretMetadata {
	fn from(record: &SecretRecord) -> Self {
		Self {
			id: record.id,
			tenant_id: record.tenant_id,
			name: record.name.clone(),
			kind: record.kind,
			created_by: record.created_by,
			updated_by: record.updated_by,
			created_at: record.created_at,
			updated_at: record.updated_at,
		}
	}
}

/// A decrypted secret handed back to an authorized caller.
#[derive(Debug)]
pub struct RevealedSecret {
	pub metadata: SecretMetadata,
	pub value: SecretString,
}

/// Caller input for creating a secret.
#[derive(Debug, Clone)]
pub struct CreateSecretInput {
	pub name: String,
	pub kind: SecretKind,
	pub value: SecretString,
}

impl CreateSecretInput {
	pub fn password(name: impl Into<String>, value: SecretString) -> Self {
		Self {
			name: name.into(),
			kind: SecretKind::Password,
			value,
		}
	}

	pub fn note(name: impl Into<String>, value: SecretString) -> Self {
		Self {
			name: name.into(),
			kind: SecretKind::Note,
			value,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kind_round_trips_through_str() {
		for kind in [SecretKind::Password, SecretKind::Note] {
			assert_eq!(kind.as_str().parse::<SecretKind>().unwrap(), kind);
		}
		assert!("token".parse::<SecretKind>().is_err());
	}

	#[test]
	fn revealed_secret_debug_hides_value() {
		let now = Utc::now();
		let revealed = RevealedSecret {
			metadata: SecretMetadata {
				id: SecretId::generate(),
				tenant_id: TenantId::generate(),
				name: "db".to_string(),
				kind: SecretKind::Password,
				created_by: PrincipalId::generate(),
				updated_by: PrincipalId::generate(),
				created_at: now,
				updated_at: now,
			},
			value: SecretString::from("Tr0ub4dor&3"),
		};
		let debug = format!("{revealed:?}");
		assert!(!debug.contains("Tr0ub4dor&3"));
		assert!(debug.contains("[REDACTED]"));
	}

	#[test]
	fn secret_id_serializes_as_bare_uuid() {
		let id = SecretId::generate();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{id}\""));
	}
}
