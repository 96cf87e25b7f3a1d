// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secrets repository for database operations.
//!
//! Rows carry the ciphertext as an opaque string. Encryption and decryption
//! happen above this layer.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::Result;

/// Stored secret row.
#[derive(Debug, Clone)]
pub struct SecretRow {
	pub id: String,
	pub tenant_id: String,
	pub name: String,
	pub kind: String,
	pub ciphertext: String,
	pub created_by: String,
	pub updated_by: String,
	pub created_at: String,
	pub updated_at: String,
}

/// Parameters for creating a secret.
#[derive(Debug, Clone)]
pub struct CreateSecretParams {
	pub id: String,
	pub tenant_id: String,
	pub name: String,
	pub kind: String,
	pub ciphertext: String,
	pub created_by: String,
	pub created_at: String,
}

/// Parameters for replacing a secret's ciphertext.
#[derive(Debug, Clone)]
pub struct UpdateCiphertextParams {
	pub id: String,
	pub ciphertext: String,
	pub updated_by: String,
	pub updated_at: String,
}

#[async_trait]
pub trait SecretsStore: Send + Sync {
	async fn insert_secret(&self, params: &CreateSecretParams) -> Result<()>;
	async fn get_secret(&self, id: &str) -> Result<Option<SecretRow>>;
	async fn list_secrets_for_tenant(&self, tenant_id: &str) -> Result<Vec<SecretRow>>;
	async fn update_ciphertext(&self, params: &UpdateCiphertextParams) -> Result<bool>;
	async fn delete_secret(&self, id: &str) -> Result<bool>;
}

/// Repository for secrets database operations.
#[derive(Clone)]
pub struct SecretsRepository {
	pool: SqlitePool,
}

impl SecretsRepository {
	/// Create a new secrets repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a secret record.
	#[tracing::instrument(skip(self, params), fields(secret_id = %params.id, tenant_id = %params.tenant_id))]
	pub async fn insert_secret(&self, params: &CreateSecretParams) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO secrets (id, tenant_id, name, kind, ciphertext, created_by, updated_by, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&params.id)
		.bind(&params.tenant_id)
		.bind(&params.name)
		.bind(&params.kind)
		.bind(&params.ciphertext)
		.bind(&params.created_by)
		.bind(&params.created_by)
		.bind(&params.created_at)
		.bind(&params.created_at)
		.execute(&self.pool)
		.await?;

		tracing::debug!(secret_id = %params.id, tenant_id = %params.tenant_id, "secret created");
		Ok(())
	}

	/// Get a secret by ID.
	#[tracing::instrument(skip(self), fields(secret_id = %id))]
	pub async fn get_secret(&self, id: &str) -> Result<Option<SecretRow>> {
		let row = sqlx::query(
			r#"
			SELECT id, tenant_id, name, kind, ciphertext, created_by, updated_by, created_at, updated_at
			FROM secrets
			WHERE id = ?
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(|r| parse_secret_row(&r)))
	}

	/// List every secret in a tenant, ordered by name.
	#[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
	pub async fn list_secrets_for_tenant(&self, tenant_id: &str) -> Result<Vec<SecretRow>> {
		let rows = sqlx::query(
			r#"
			SELECT id, tenant_id, name, kind, ciphertext, created_by, updated_by, created_at, updated_at
			FROM secrets
			WHERE tenant_id = ?
			ORDER BY name ASC, created_at ASC
			"#,
		)
		.bind(tenant_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.iter().map(parse_secret_row).collect())
	}

	/// Replace the stored ciphertext wholesale.
	///
	/// Returns `false` if no secret has this ID.
	#[tracing::instrument(skip(self, params), fields(secret_id = %params.id))]
	pub async fn update_ciphertext(&self, params: &UpdateCiphertextParams) -> Result<bool> {
		let result = sqlx::query(
			r#"
			UPDATE secrets
			SET ciphertext = ?, updated_by = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&params.ciphertext)
		.bind(&params.updated_by)
		.bind(&params.updated_at)
		.bind(&params.id)
		.execute(&self.pool)
		.await?;

		let updated = result.rows_affected() > 0;
		if updated {
			tracing::debug!(secret_id = %params.id, "secret ciphertext replaced");
		}
		Ok(updated)
	}

	/// Delete a secret.
	///
	/// Returns `true` if a row was deleted.
	#[tracing::instrument(skip(self), fields(secret_id = %id))]
	pub async fn delete_secret(&self, id: &str) -> Result<bool> {
		let result = sqlx::query("DELETE FROM secrets WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(secret_id = %id, "secret deleted");
		}
		Ok(deleted)
	}
}

#[async_trait]
impl SecretsStore for SecretsRepository {
	async fn insert_secret(&self, params: &CreateSecretParams) -> Result<()> {
		SecretsRepository::insert_secret(self, params).await
	}

	async fn get_secret(&self, id: &str) -> Result<Option<SecretRow>> {
		SecretsRepository::get_secret(self, id).await
	}

	async fn list_secrets_for_tenant(&self, tenant_id: &str) -> Result<Vec<SecretRow>> {
		SecretsRepository::list_secrets_for_tenant(self, tenant_id).await
	}

	async fn update_ciphertext(&self, params: &UpdateCiphertextParams) -> Result<bool> {
		SecretsRepository::update_ciphertext(self, params).await
	}

	async fn delete_secret(&self, id: &str) -> Result<bool> {
		SecretsRepository::delete_secret(self, id).await
	}
}

fn parse_secret_row(row: &sqlx::sqlite::SqliteRow) -> SecretRow {
	SecretRow {
		id: row.get("id"),
		tenant_id: row.get("tenant_id"),
		name: row.get("name"),
		kind: row.get("kind"),
		ciphertext: row.get("ciphertext"),
		created_by: row.get("created_by"),
		updated_by: row.get("updated_by"),
		created_at: row.get("created_at"),
		updated_at: row.get("updated_at"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_migrated_test_pool;
	use proptest::prelude::*;

	fn params(tenant_id: &str, name: &str) -> CreateSecretParams {
		CreateSecretParams {
			id: uuid::Uuid::new_v4().to_string(),
			tenant_id: tenant_id.to_string(),
			name: name.to_string(),
			kind: "password".to_string(),
			ciphertext: "AQAAAA==".to_string(),
			created_by: uuid::Uuid::new_v4().to_string(),
			created_at: "2025-01-01T00:00:00+00:00".to_string(),
		}
	}

	#[tokio::test]
	async fn insert_and_get_round_trip() {
		let repo = SecretsRepository::new(create_migrated_test_pool().await);
		let p = params("tenant-a", "github");
		repo.insert_secret(&p).await.unwrap();

		let row = repo.get_secret(&p.id).await.unwrap().unwrap();
		assert_eq!(row.name, "github");
		assert_eq!(row.ciphertext, p.ciphertext);
		assert_eq!(row.updated_by, p.created_by);
		assert_eq!(row.updated_at, p.created_at);
	}

	#[tokio::test]
	async fn get_unknown_is_none() {
		let repo = SecretsRepository::new(create_migrated_test_pool().await);
		assert!(repo.get_secret("missing").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn list_is_tenant_scoped_and_sorted() {
		let repo = SecretsRepository::new(create_migrated_test_pool().await);
		for name in ["zeta", "alpha"] {
			repo.insert_secret(&params("tenant-a", name)).await.unwrap();
		}
		repo.insert_secret(&params("tenant-b", "beta")).await.unwrap();

		let names: Vec<String> = repo
			.list_secrets_for_tenant("tenant-a")
			.await
			.unwrap()
			.into_iter()
			.map(|r| r.name)
			.collect();
		assert_eq!(names, vec!["alpha", "zeta"]);
	}

	#[tokio::test]
	async fn update_replaces_ciphertext() {
		let repo = SecretsRepository::new(create_migrated_test_pool().await);
		let p = params("tenant-a", "db");
		repo.insert_secret(&p).await.unwrap();

		let updated = repo
			.update_ciphertext(&UpdateCiphertextParams {
				id: p.id.clone(),
				ciphertext: "AQBBBB==".to_string(),
				updated_by: "someone-else".to_string(),
				updated_at: "2025-02-01T00:00:00+00:00".to_string(),
			})
			.await
			.unwrap();
		assert!(updated);

		let row = repo.get_secret(&p.id).await.unwrap().unwrap();
		assert_eq!(row.ciphertext, "AQBBBB==");
		assert_eq!(row.updated_by, "someone-else");
		assert_eq!(row.created_by, p.created_by);
	}

	#[tokio::test]
	async fn update_and_delete_unknown_report_false() {
		let repo = SecretsRepository::new(create_migrated_test_pool().await);
		let updated = repo
			.update_ciphertext(&UpdateCiphertextParams {
				id: "missing".to_string(),
				ciphertext: "x".to_string(),
				updated_by: "x".to_string(),
				updated_at: "x".to_string(),
			})
			.await
			.unwrap();
		assert!(!updated);
		assert!(!repo.delete_secret("missing").await.unwrap());
	}

	#[tokio::test]
	async fn delete_removes_row() {
		let repo = SecretsRepository::new(create_migrated_test_pool().await);
		let p = params("tenant-a", "db");
		repo.insert_secret(&p).await.unwrap();

		assert!(repo.delete_secret(&p.id).await.unwrap());
		assert!(repo.get_secret(&p.id).await.unwrap().is_none());
	}

	proptest! {
		#[test]
		fn names_survive_storage(name in "\\PC{1,64}") {
			let rt = tokio::runtime::Runtime::new().unwrap();
			rt.block_on(async {
				let repo = SecretsRepository::new(create_migrated_test_pool().await);
				let p = params("tenant-a", &name);
				repo.insert_secret(&p).await.unwrap();
				let row = repo.get_secret(&p.id).await.unwrap().unwrap();
				assert_eq!(row.name, name);
			});
		}
	}
}
