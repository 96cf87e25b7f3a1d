// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state assembled once at startup.

use std::sync::Arc;

use hydia_server_auth::{MembershipService, PermissionGate};
use hydia_server_config::{GeneratorConfig, ServerConfig};
use hydia_server_db::{create_pool, run_migrations, MembershipRepository, SecretsRepository};
use hydia_server_vault::{GenerationPolicy, SecretCipher, SqliteSecretStore, VaultService};
use sqlx::sqlite::SqlitePool;
use tracing::info;

use crate::error::StartupError;

pub type Vault = VaultService<MembershipRepository, SqliteSecretStore>;

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub members: Arc<MembershipService<MembershipRepository>>,
	pub vault: Arc<Vault>,
}

impl AppState {
	/// Validate the key and generator policy, open the database and wire
	/// the services.
	///
	/// The key is checked before the database is touched, so a missing or
	/// malformed key fails without side effects.
	pub async fn build(config: &ServerConfig) -> Result<Self, StartupError> {
		let cipher = SecretCipher::from_config(config.vault.encryption_key.as_ref())?;
		let policy = generation_policy(&config.generator);

		let pool = create_pool(&config.database.url).await?;
		run_migrations(&pool).await?;

		let memberships = Arc::new(MembershipRepository::new(pool.clone()));
		let members = Arc::new(MembershipService::new(Arc::clone(&memberships)));
		let store = Arc::new(SqliteSecretStore::new(SecretsRepository::new(pool.clone())));
		let vault = Arc::new(
			VaultService::new(PermissionGate::new(memberships), store, cipher)
				.with_default_policy(policy)?,
		);

		info!(
			database = %config.database.url,
			default_length = policy.length,
			"application state ready"
		);

		Ok(Self {
			pool,
			members,
			vault,
		})
	}
}

/// The generator section of the config as a generation policy.
pub fn generation_policy(config: &GeneratorConfig) -> GenerationPolicy {
	GenerationPolicy {
		length: config.length,
		include_uppercase: config.include_uppercase,
		include_lowercase: config.include_lowercase,
		include_numbers: config.include_numbers,
		include_symbols: config.include_symbols,
		exclude_similar: config.exclude_similar,
	}
}
