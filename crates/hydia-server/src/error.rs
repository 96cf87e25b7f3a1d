// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use hydia_server_config::ConfigError;
use hydia_server_db::DbError;
use hydia_server_vault::{CryptoError, VaultError};
use thiserror::Error;

/// Errors that abort server startup.
#[derive(Debug, Error)]
pub enum StartupError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("encryption key rejected: {0}")]
	Key(#[from] CryptoError),

	#[error("database error: {0}")]
	Database(#[from] DbError),

	#[error("invalid vault configuration: {0}")]
	Vault(#[from] VaultError),
}
