// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_tenant_memberships",
		include_str!("../migrations/001_tenant_memberships.sql"),
	),
	("002_secrets", include_str!("../migrations/002_secrets.sql")),
];

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./hydia.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Create the membership and secret tables.
///
/// Migrations are idempotent; running them twice is a no-op.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !strip_comments(s).is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = %name, "migration applied");
	}
	Ok(())
}

fn strip_comments(stmt: &str) -> String {
	stmt
		.lines()
		.filter(|l| !l.trim_start().starts_with("--"))
		.collect::<Vec<_>>()
		.join("\n")
		.trim()
		.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = create_test_pool().await;
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<(String,)> = sqlx::query_as(
			"SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();
		let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
		assert!(names.contains(&"secrets"));
		assert!(names.contains(&"tenant_memberships"));
	}

	#[tokio::test]
	async fn file_backed_pool_is_created() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("hydia.db").display());
		let pool = create_pool(&url).await.unwrap();
		run_migrations(&pool).await.unwrap();
		assert!(dir.path().join("hydia.db").exists());
	}

	#[tokio::test]
	async fn invalid_url_is_internal_error() {
		let err = create_pool("sqlite:hydia.db?mode=bogus").await.unwrap_err();
		assert!(matches!(err, DbError::Internal(_)));
	}
}
