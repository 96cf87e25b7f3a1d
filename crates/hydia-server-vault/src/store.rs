// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence seam for encrypted secrets.
//!
//! The store sees ciphertext and metadata only. Plaintext never crosses this
//! trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hydia_server_auth::{PrincipalId, TenantId};
use hydia_server_db::{CreateSecretParams, SecretRow, SecretsRepository, SecretsStore, UpdateCiphertextParams};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cipher::Ciphertext;
use crate::error::StoreError;
use crate::types::{NewSecret, SecretId, SecretKind, SecretRecord};

#[async_trait]
pub trait SecretStore: Send + Sync {
	/// Persist a new record and return its assigned ID.
	async fn persist(&self, secret: NewSecret) -> Result<SecretId, StoreError>;

	async fn fetch(&self, id: SecretId) -> Result<Option<SecretRecord>, StoreError>;

	/// Replace the ciphertext of an existing record. Returns `false` if there
	/// is no such record.
	async fn replace_ciphertext(
		&self,
		id: SecretId,
		ciphertext: Ciphertext,
		updated_by: PrincipalId,
	) -> Result<bool, StoreError>;

	async fn delete(&self, id: SecretId) -> Result<bool, StoreError>;

	async fn list(&self, tenant_id: TenantId) -> Result<Vec<SecretRecord>, StoreError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local secret store for tests and single-node development.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
	records: RwLock<HashMap<SecretId, SecretRecord>>,
}

impl InMemorySecretStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
	async fn persist(&self, secret: NewSecret) -> Result<SecretId, StoreError> {
		let id = SecretId::generate();
		let now = Utc::now();
		let record = SecretRecord {
			id,
			tenant_id: secret.tenant_id,
			name: secret.name,
			kind: secret.kind,
			ciphertext: secret.ciphertext,
			created_by: secret.created_by,
			updated_by: secret.created_by,
			created_at: now,
			updated_at: now,
		};
		self.records.write().await.insert(id, record);
		debug!(secret_id = %id, "secret stored in memory");
		Ok(id)
	}

	async fn fetch(&self, id: SecretId) -> Result<Option<SecretRecord>, StoreError> {
		Ok(self.records.read().await.get(&id).cloned())
	}

	async fn replace_ciphertext(
		&self,
		id: SecretId,
		ciphertext: Ciphertext,
		updated_by: PrincipalId,
	) -> Result<bool, StoreError> {
		let mut records = self.records.write().await;
		match records.get_mut(&id) {
			Some(record) => {
				record.ciphertext = ciphertext;
				record.updated_by = updated_by;
				record.updated_at = Utc::now();
				Ok(true)
			}
			None => Ok(false),
		}
	}

	async fn delete(&self, id: SecretId) -> Result<bool, StoreError> {
		Ok(self.records.write().await.remove(&id).is_some())
	}

	async fn list(&self, tenant_id: TenantId) -> Result<Vec<SecretRecord>, StoreError> {
		let mut records: Vec<SecretRecord> = self
			.records
			.read()
			.await
			.values()
			.filter(|r| r.tenant_id == tenant_id)
			.cloned()
			.collect();
		records.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
		Ok(records)
	}
}

// =============================================================================
// SQLite store
// =============================================================================

/// Secret store backed by the `secrets` table.
#[derive(Clone)]
pub struct SqliteSecretStore<R: SecretsStore = SecretsRepository> {
	repo: R,
}

impl<R: SecretsStore> SqliteSecretStore<R> {
	pub fn new(repo: R) -> Self {
		Self { repo }
	}
}

#[async_trait]
impl<R: SecretsStore> SecretStore for SqliteSecretStore<R> {
	async fn persist(&self, secret: NewSecret) -> Result<SecretId, StoreError> {
		let id = SecretId::generate();
		let params = CreateSecretParams {
			id: id.to_string(),
			tenant_id: secret.tenant_id.to_string(),
			name: secret.name,
			kind: secret.kind.as_str().to_string(),
			ciphertext: secret.ciphertext.into_inner(),
			created_by: secret.created_by.to_string(),
			created_at: Utc::now().to_rfc3339(),
		};
		self.repo.insert_secret(&params).await?;
		Ok(id)
	}

	async fn fetch(&self, id: SecretId) -> Result<Option<SecretRecord>, StoreError> {
		match self.repo.get_secret(&id.to_string()).await? {
			Some(row) => Ok(Some(record_from_row(row)?)),
			None => Ok(None),
		}
	}

	async fn replace_ciphertext(
		&self,
		id: SecretId,
		ciphertext: Ciphertext,
		updated_by: PrincipalId,
	) -> Result<bool, StoreError> {
		let params = UpdateCiphertextParams {
			id: id.to_string(),
			ciphertext: ciphertext.into_inner(),
			updated_by: updated_by.to_string(),
			updated_at: Utc::now().to_rfc3339(),
		};
		Ok(self.repo.update_ciphertext(&params).await?)
	}

	async fn delete(&self, id: SecretId) -> Result<bool, StoreError> {
		Ok(self.repo.delete_secret(&id.to_string()).await?)
	}

	async fn list(&self, tenant_id: TenantId) -> Result<Vec<SecretRecord>, StoreError> {
		self
			.repo
			.list_secrets_for_tenant(&tenant_id.to_string())
			.await?
			.into_iter()
			.map(record_from_row)
			.collect()
	}
}

fn record_from_row(row: SecretRow) -> Result<SecretRecord, StoreError> {
	let corrupt = |field: &str, detail: String| {
		StoreError::Corrupt(format!("secret {}: invalid {field}: {detail}", row.id))
	};

	Ok(SecretRecord {
		id: row.id.parse().map_err(|e: uuid::Error| corrupt("id", e.to_string()))?,
		tenant_id: row
			.tenant_id
			.parse()
			.map_err(|e: uuid::Error| corrupt("tenant_id", e.to_string()))?,
		name: row.name.clone(),
		kind: row
			.kind
			.parse::<SecretKind>()
			.map_err(|e| corrupt("kind", e))?,
		ciphertext: Ciphertext::from_stored(row.ciphertext.clone()),
		created_by: row
			.created_by
			.parse()
			.map_err(|e: uuid::Error| corrupt("created_by", e.to_string()))?,
		updated_by: row
			.updated_by
			.parse()
			.map_err(|e: uuid::Error| corrupt("updated_by", e.to_string()))?,
		created_at: parse_timestamp(&row.created_at).map_err(|e| corrupt("created_at", e))?,
		updated_at: parse_timestamp(&row.updated_at).map_err(|e| corrupt("updated_at", e))?,
	})
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlx::sqlite::SqlitePoolOptions;
	use sqlx::SqlitePool;

	async fn migrated_pool() -> SqlitePool {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect(":memory:")
			.await
			.expect("Failed to create in-memory SQLite pool");
		hydia_server_db::run_migrations(&pool)
			.await
			.expect("Failed to run migrations");
		pool
	}

	fn new_secret(tenant_id: TenantId, name: &str) -> NewSecret {
		NewSecret {
			tenant_id,
			name: name.to_string(),
			kind: SecretKind::Password,
			ciphertext: Ciphertext::from_stored(format!("ct-{name}")),
			created_by: PrincipalId::generate(),
		}
	}

	async fn exercise_store<S: SecretStore>(store: &S) {
		let tenant = TenantId::generate();
		let other = TenantId::generate();

		let b = store.persist(new_secret(tenant, "b")).await.unwrap();
		let a = store.persist(new_secret(tenant, "a")).await.unwrap();
		store.persist(new_secret(other, "c")).await.unwrap();

		let listed = store.list(tenant).await.unwrap();
		let names: Vec<&str> = listed.iter().map(|r| r.name.as_str()).collect();
		assert_eq!(names, vec!["a", "b"]);

		let fetched = store.fetch(b).await.unwrap().unwrap();
		assert_eq!(fetched.ciphertext.as_str(), "ct-b");
		assert_eq!(fetched.tenant_id, tenant);
		assert_eq!(fetched.created_by, fetched.updated_by);

		let editor = PrincipalId::generate();
		assert!(store
			.replace_ciphertext(b, Ciphertext::from_stored("ct-b2"), editor)
			.await
			.unwrap());
		let fetched = store.fetch(b).await.unwrap().unwrap();
		assert_eq!(fetched.ciphertext.as_str(), "ct-b2");
		assert_eq!(fetched.updated_by, editor);

		assert!(store.delete(a).await.unwrap());
		assert!(!store.delete(a).await.unwrap());
		assert!(store.fetch(a).await.unwrap().is_none());
		assert!(!store
			.replace_ciphertext(a, Ciphertext::from_stored("x"), editor)
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn in_memory_store_lifecycle() {
		exercise_store(&InMemorySecretStore::new()).await;
	}

	#[tokio::test]
	async fn sqlite_store_lifecycle() {
		let store = SqliteSecretStore::new(SecretsRepository::new(migrated_pool().await));
		exercise_store(&store).await;
	}

	#[tokio::test]
	async fn sqlite_store_reports_corrupt_rows() {
		let pool = migrated_pool().await;
		let tenant = TenantId::generate();
		sqlx::query(
			r#"
			INSERT INTO secrets (id, tenant_id, name, kind, ciphertext, created_by, updated_by, created_at, updated_at)
			VALUES (?, ?, 'broken', 'token', 'ct', ?, ?, ?, ?)
			"#,
		)
		.bind(SecretId::generate().to_string())
		.bind(tenant.to_string())
		.bind(PrincipalId::generate().to_string())
		.bind(PrincipalId::generate().to_string())
		.bind(Utc::now().to_rfc3339())
		.bind(Utc::now().to_rfc3339())
		.execute(&pool)
		.await
		.unwrap();

		let store = SqliteSecretStore::new(SecretsRepository::new(pool));
		let err = store.list(tenant).await.unwrap_err();
		assert!(matches!(err, StoreError::Corrupt(msg) if msg.contains("kind")));
	}

	#[tokio::test]
	async fn sqlite_store_unavailable_when_pool_closed() {
		let pool = migrated_pool().await;
		pool.close().await;
		let store = SqliteSecretStore::new(SecretsRepository::new(pool));
		let err = store.fetch(SecretId::generate()).await.unwrap_err();
		assert!(matches!(err, StoreError::Unavailable(_)));
	}
}
