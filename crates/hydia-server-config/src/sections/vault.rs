// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vault configuration: the master encryption key.
//!
//! The key is only ever read from the environment
//! (`HYDIA_SERVER_ENCRYPTION_KEY` or `HYDIA_SERVER_ENCRYPTION_KEY_FILE`). A
//! TOML file cannot carry it.

use hydia_common_secret::SecretString;
use serde::Deserialize;

pub const ENCRYPTION_KEY_ENV: &str = "HYDIA_SERVER_ENCRYPTION_KEY";

#[derive(Debug, Clone, Default)]
pub struct VaultConfig {
	/// Base64-encoded 32-byte AES key. Validated at startup, not here.
	pub encryption_key: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultConfigLayer {
	#[serde(skip)]
	pub encryption_key: Option<SecretString>,
}

impl VaultConfigLayer {
	pub fn merge(&mut self, other: VaultConfigLayer) {
		if other.encryption_key.is_some() {
			self.encryption_key = other.encryption_key;
		}
	}

	pub fn finalize(self) -> VaultConfig {
		VaultConfig {
			encryption_key: self.encryption_key,
		}
	}
}
