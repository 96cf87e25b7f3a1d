// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Symmetric encryption of secret values.
//!
//! AES-256-GCM under a single process-wide key that is injected at
//! construction. Every call draws a fresh 96-bit nonce from `OsRng`, so
//! encrypting the same plaintext twice yields different ciphertexts.
//!
//! # Stored format
//!
//! ```text
//! base64( version:u8 = 0x01 || nonce:[u8; 12] || ciphertext || tag:[u8; 16] )
//! ```

use std::fmt;

use aes_gcm::{
	aead::{Aead, KeyInit, OsRng},
	Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hydia_common_secret::SecretString;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Size of encryption keys in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Leading byte of every ciphertext produced by this module.
pub const FORMAT_VERSION: u8 = 0x01;

const HEADER_SIZE: usize = 1 + NONCE_SIZE;

/// Encrypted, storage-safe form of a secret value.
///
/// Safe to log and persist; it reveals nothing but the plaintext length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(String);

impl Ciphertext {
	/// Wrap a value read back from storage. Not validated until decryption.
	pub fn from_stored(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

impl fmt::Display for Ciphertext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Generate a random encryption key.
pub fn generate_key() -> Zeroizing<[u8; KEY_SIZE]> {
	let mut key = Zeroizing::new([0u8; KEY_SIZE]);
	OsRng.fill_bytes(key.as_mut());
	key
}

/// Encode a key the way `HYDIA_SERVER_ENCRYPTION_KEY` expects it.
pub fn encode_key(key: &[u8; KEY_SIZE]) -> SecretString {
	SecretString::new(STANDARD.encode(key))
}

fn generate_nonce() -> [u8; NONCE_SIZE] {
	let mut nonce = [0u8; NONCE_SIZE];
	OsRng.fill_bytes(&mut nonce);
	nonce
}

/// Encrypts and decrypts secret values under one key.
#[derive(Clone)]
pub struct SecretCipher {
	key: Zeroizing<[u8; KEY_SIZE]>,
}

impl fmt::Debug for SecretCipher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SecretCipher")
			.field("key", &hydia_common_secret::REDACTED)
			.finish()
	}
}

impl SecretCipher {
	pub fn new(key: Zeroizing<[u8; KEY_SIZE]>) -> Self {
		Self { key }
	}

	/// Build a cipher from a standard-base64 encoded 32-byte key.
	///
	/// # Errors
	/// `CryptoError::MissingKey` for an empty value, `CryptoError::InvalidKey`
	/// if it is not base64 or does not decode to exactly 32 bytes.
	pub fn from_base64(encoded: &SecretString) -> Result<Self, CryptoError> {
		let encoded = encoded.expose().trim();
		if encoded.is_empty() {
			return Err(CryptoError::MissingKey);
		}

		let decoded = Zeroizing::new(
			STANDARD
				.decode(encoded)
				.map_err(|_| CryptoError::InvalidKey("key is not valid base64".to_string()))?,
		);
		if decoded.len() != KEY_SIZE {
			return Err(CryptoError::InvalidKey(format!(
				"expected {KEY_SIZE} bytes, got {}",
				decoded.len()
			)));
		}

		let mut key = Zeroizing::new([0u8; KEY_SIZE]);
		key.copy_from_slice(&decoded);
		Ok(Self::new(key))
	}

	/// Build a cipher from an optional configured key.
	pub fn from_config(encoded: Option<&SecretString>) -> Result<Self, CryptoError> {
		Self::from_base64(encoded.ok_or(CryptoError::MissingKey)?)
	}

	fn aead(&self) -> Aes256Gcm {
		Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_slice()))
	}

	/// Encrypt a non-empty plaintext.
	pub fn encrypt(&self, plaintext: &SecretString) -> Result<Ciphertext, CryptoError> {
		if plaintext.is_empty() {
			return Err(CryptoError::EmptyPlaintext);
		}

		let nonce_bytes = generate_nonce();
		let sealed = self
			.aead()
			.encrypt(
				Nonce::from_slice(&nonce_bytes),
				plaintext.expose().as_bytes(),
			)
			.map_err(|_| CryptoError::Encryption)?;

		let mut framed = Vec::with_capacity(HEADER_SIZE + sealed.len());
		framed.push(FORMAT_VERSION);
		framed.extend_from_slice(&nonce_bytes);
		framed.extend_from_slice(&sealed);

		Ok(Ciphertext(STANDARD.encode(framed)))
	}

	/// Decrypt and authenticate a ciphertext produced by [`Self::encrypt`].
	pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<SecretString, CryptoError> {
		let framed = STANDARD
			.decode(ciphertext.as_str())
			.map_err(|_| CryptoError::Malformed("not valid base64".to_string()))?;

		let Some(&version) = framed.first() else {
			return Err(CryptoError::Malformed("empty ciphertext".to_string()));
		};
		if version != FORMAT_VERSION {
			return Err(CryptoError::UnsupportedVersion(version));
		}
		if framed.len() < HEADER_SIZE + TAG_SIZE {
			return Err(CryptoError::Malformed(format!(
				"expected at least {} bytes, got {}",
				HEADER_SIZE + TAG_SIZE,
				framed.len()
			)));
		}

		let (header, sealed) = framed.split_at(HEADER_SIZE);
		let plaintext = Zeroizing::new(
			self
				.aead()
				.decrypt(Nonce::from_slice(&header[1..]), sealed)
				.map_err(|_| CryptoError::Decryption)?,
		);

		let text = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::InvalidUtf8)?;
		Ok(SecretString::new(text.to_string()))
	}
}

/// Encrypt `plaintext` under `key`.
pub fn encrypt(plaintext: &SecretString, key: &[u8; KEY_SIZE]) -> Result<Ciphertext, CryptoError> {
	SecretCipher::new(Zeroizing::new(*key)).encrypt(plaintext)
}

/// Decrypt `ciphertext` under `key`.
pub fn decrypt(ciphertext: &Ciphertext, key: &[u8; KEY_SIZE]) -> Result<SecretString, CryptoError> {
	SecretCipher::new(Zeroizing::new(*key)).decrypt(ciphertext)
}
