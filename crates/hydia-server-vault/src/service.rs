// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vault service providing the tenant-scoped secret lifecycle.
//!
//! This service combines:
//! - The permission gate, consulted before anything else on every operation
//! - The secret cipher
//! - The secret store, which only ever receives ciphertext
//!
//! A record that belongs to another tenant is reported as not found, so
//! membership in one tenant reveals nothing about secret IDs in another.

use std::sync::Arc;

use hydia_common_secret::SecretString;
use hydia_server_auth::{MembershipStore, Operation, PermissionGate, PrincipalId, TenantId};
use tracing::{info, instrument, warn};

use crate::cipher::SecretCipher;
use crate::error::{VaultError, VaultResult};
use crate::generator::{self, GenerationPolicy};
use crate::store::SecretStore;
use crate::types::{
	CreateSecretInput, NewSecret, RevealedSecret, SecretId, SecretMetadata, SecretRecord,
};

pub const MAX_SECRET_NAME_LENGTH: usize = 128;
pub const MAX_SECRET_VALUE_SIZE: usize = 64 * 1024;

pub struct VaultService<M: MembershipStore, S: SecretStore> {
	gate: PermissionGate<M>,
	store: Arc<S>,
	cipher: SecretCipher,
	default_policy: GenerationPolicy,
}

impl<M: MembershipStore, S: SecretStore> VaultService<M, S> {
	pub fn new(gate: PermissionGate<M>, store: Arc<S>, cipher: SecretCipher) -> Self {
		Self {
			gate,
			store,
			cipher,
			default_policy: GenerationPolicy::default(),
		}
	}

	/// Use `policy` when [`Self::generate_password`] is called without one.
	pub fn with_default_policy(mut self, policy: GenerationPolicy) -> VaultResult<Self> {
		policy.validate()?;
		self.default_policy = policy;
		Ok(self)
	}

	pub fn gate(&self) -> &PermissionGate<M> {
		&self.gate
	}

	pub fn default_policy(&self) -> &GenerationPolicy {
		&self.default_policy
	}

	#[instrument(skip_all, fields(tenant_id = %tenant_id, principal_id = %principal_id, name = %input.name, kind = %input.kind))]
	pub async fn create_secret(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		input: CreateSecretInput,
	) -> VaultResult<SecretId> {
		self
			.gate
			.authorize(tenant_id, principal_id, Operation::CreateSecret)
			.await?;

		validate_secret_name(&input.name)?;
		validate_secret_value(&input.value)?;

		let ciphertext = self.cipher.encrypt(&input.value)?;
		let id = self
			.store
			.persist(NewSecret {
				tenant_id,
				name: input.name,
				kind: input.kind,
				ciphertext,
				created_by: principal_id,
			})
			.await?;

		info!(secret_id = %id, "Created secret");
		Ok(id)
	}

	#[instrument(skip_all, fields(tenant_id = %tenant_id, principal_id = %principal_id, secret_id = %secret_id))]
	pub async fn reveal_secret(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		secret_id: SecretId,
	) -> VaultResult<RevealedSecret> {
		self
			.gate
			.authorize(tenant_id, principal_id, Operation::ReadSecret)
			.await?;

		let record = self.fetch_in_tenant(tenant_id, secret_id).await?;
		let value = self.cipher.decrypt(&record.ciphertext).map_err(|e| {
			warn!(error = %e, "Failed to decrypt secret");
			e
		})?;

		info!("Revealed secret");
		Ok(RevealedSecret {
			metadata: SecretMetadata::from(&record),
			value,
		})
	}

	/// Replace the value of a secret. The old ciphertext is discarded.
	#[instrument(skip_all, fields(tenant_id = %tenant_id, principal_id = %principal_id, secret_id = %secret_id))]
	pub async fn update_secret(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		secret_id: SecretId,
		value: SecretString,
	) -> VaultResult<()> {
		self
			.gate
			.authorize(tenant_id, principal_id, Operation::UpdateSecret)
			.await?;

		validate_secret_value(&value)?;
		self.fetch_in_tenant(tenant_id, secret_id).await?;

		let ciphertext = self.cipher.encrypt(&value)?;
		if !self
			.store
			.replace_ciphertext(secret_id, ciphertext, principal_id)
			.await?
		{
			return Err(VaultError::NotFound(secret_id));
		}

		info!("Updated secret");
		Ok(())
	}

	#[instrument(skip_all, fields(tenant_id = %tenant_id, principal_id = %principal_id, secret_id = %secret_id))]
	pub async fn delete_secret(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
		secret_id: SecretId,
	) -> VaultResult<()> {
		self
			.gate
			.authorize(tenant_id, principal_id, Operation::DeleteSecret)
			.await?;

		self.fetch_in_tenant(tenant_id, secret_id).await?;
		if !self.store.delete(secret_id).await? {
			return Err(VaultError::NotFound(secret_id));
		}

		info!("Deleted secret");
		Ok(())
	}

	/// List the secrets of a tenant. Values are never decrypted here.
	#[instrument(skip_all, fields(tenant_id = %tenant_id, principal_id = %principal_id))]
	pub async fn list_secrets(
		&self,
		tenant_id: TenantId,
		principal_id: PrincipalId,
	) -> VaultResult<Vec<SecretMetadata>> {
		self
			.gate
			.authorize(tenant_id, principal_id, Operation::ListSecrets)
			.await?;

		let records = self.store.list(tenant_id).await?;
		Ok(records.iter().map(SecretMetadata::from).collect())
	}

	/// Copy a secret into another tenant the principal can write to.
	///
	/// The copy is re-encrypted under a fresh nonce, so the two ciphertexts
	/// are unrelated.
	#[instrument(skip_all, fields(source_tenant = %source_tenant, target_tenant = %target_tenant, principal_id = %principal_id, secret_id = %secret_id))]
	pub async fn share_secret(
		&self,
		source_tenant: TenantId,
		principal_id: PrincipalId,
		secret_id: SecretId,
		target_tenant: TenantId,
	) -> VaultResult<SecretId> {
		if source_tenant == target_tenant {
			return Err(VaultError::InvalidInput(
				"source and target tenant must differ".into(),
			));
		}

		self
			.gate
			.authorize(source_tenant, principal_id, Operation::ShareSecret)
			.await?;
		self
			.gate
			.authorize(target_tenant, principal_id, Operation::CreateSecret)
			.await?;

		let record = self.fetch_in_tenant(source_tenant, secret_id).await?;
		let value = self.cipher.decrypt(&record.ciphertext).map_err(|e| {
			warn!(error = %e, "Failed to decrypt secret for sharing");
			e
		})?;
		let ciphertext = self.cipher.encrypt(&value)?;

		let shared_id = self
			.store
			.persist(NewSecret {
				tenant_id: target_tenant,
				name: record.name,
				kind: record.kind,
				ciphertext,
				created_by: principal_id,
			})
			.await?;

		info!(shared_id = %shared_id, "Shared secret");
		Ok(shared_id)
	}

	/// Generate a password. Not tenant-scoped and not gated.
	pub fn generate_password(&self, policy: Option<GenerationPolicy>) -> VaultResult<SecretString> {
		let policy = policy.unwrap_or(self.default_policy);
		let password = generator::generate(&policy)?;
		Ok(SecretString::new(password))
	}

	async fn fetch_in_tenant(
		&self,
		tenant_id: TenantId,
		secret_id: SecretId,
	) -> VaultResult<SecretRecord> {
		match self.store.fetch(secret_id).await? {
			Some(record) if record.tenant_id == tenant_id => Ok(record),
			_ => Err(VaultError::NotFound(secret_id)),
		}
	}
}

fn validate_secret_name(name: &str) -> VaultResult<()> {
	let length = name.chars().count();
	if name.trim().is_empty() || length > MAX_SECRET_NAME_LENGTH {
		return Err(VaultError::InvalidInput(format!(
			"name must be 1-{MAX_SECRET_NAME_LENGTH} characters"
		)));
	}
	Ok(())
}

fn validate_secret_value(value: &SecretString) -> VaultResult<()> {
	if value.is_empty() {
		return Err(VaultError::InvalidInput("secret value must not be empty".into()));
	}
	if value.len() > MAX_SECRET_VALUE_SIZE {
		return Err(VaultError::InvalidInput(
			"secret value too large (max 64 KiB)".into(),
		));
	}
	Ok(())
}
