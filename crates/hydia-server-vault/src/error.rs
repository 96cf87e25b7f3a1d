// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the vault.

use hydia_server_auth::AuthError;
use hydia_server_db::DbError;
use thiserror::Error;

use crate::types::SecretId;

/// Result type alias for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Encryption and decryption failures.
///
/// A decryption failure is always an error. The cipher never returns partial
/// or unauthenticated plaintext.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
	// =========================================================================
	// Key Errors
	// =========================================================================
	#[error("encryption key is not configured")]
	MissingKey,

	#[error("invalid encryption key: {0}")]
	InvalidKey(String),

	// =========================================================================
	// Encryption Errors
	// =========================================================================
	#[error("refusing to encrypt an empty plaintext")]
	EmptyPlaintext,

	#[error("encryption failed")]
	Encryption,

	// =========================================================================
	// Decryption Errors
	// =========================================================================
	#[error("malformed ciphertext: {0}")]
	Malformed(String),

	#[error("unsupported ciphertext version: {0}")]
	UnsupportedVersion(u8),

	#[error("decryption failed: ciphertext was tampered with or the key does not match")]
	Decryption,

	#[error("decrypted plaintext is not valid UTF-8")]
	InvalidUtf8,
}

/// An invalid password generation policy. The message names the violated
/// constraint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
	#[error("password length {length} is outside the allowed range {min}..={max}")]
	LengthOutOfRange {
		length: usize,
		min: usize,
		max: usize,
	},

	#[error("at least one character class must be enabled")]
	NoCharacterClasses,
}

/// Failures of the secret store itself. "No such record" is `Ok(None)`, never
/// an error.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("secret store unavailable: {0}")]
	Unavailable(String),

	#[error("corrupt secret record: {0}")]
	Corrupt(String),
}

impl From<DbError> for StoreError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::Internal(msg) => StoreError::Corrupt(msg),
			other => StoreError::Unavailable(other.to_string()),
		}
	}
}

/// Errors surfaced by [`crate::VaultService`].
#[derive(Debug, Error)]
pub enum VaultError {
	#[error(transparent)]
	Crypto(#[from] CryptoError),

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error("secret not found: {0}")]
	NotFound(SecretId),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Store(#[from] StoreError),
}

impl VaultError {
	/// Returns true if this error should be logged at error level.
	pub fn is_internal(&self) -> bool {
		self.status_code() >= 500
	}

	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			VaultError::Validation(_) | VaultError::InvalidInput(_) => 400,
			VaultError::Auth(e) => e.status_code(),
			VaultError::NotFound(_) => 404,
			VaultError::Crypto(_) | VaultError::Store(_) => 500,
		}
	}
}
