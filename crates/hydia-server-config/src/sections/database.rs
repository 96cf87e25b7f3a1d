// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vault database location.
//!
//! Secrets and memberships live in one SQLite database, so the URL must use
//! the `sqlite:` scheme.

use serde::Deserialize;

const DEFAULT_URL: &str = "sqlite:./hydia.db";
const SCHEME: &str = "sqlite:";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
		}
	}
}

impl DatabaseConfig {
	/// Reject URLs the SQLite pool cannot open.
	pub fn validate(&self) -> Result<(), String> {
		if self.url.is_empty() {
			return Err("database.url must not be empty".to_string());
		}
		match self.url.strip_prefix(SCHEME) {
			Some(rest) if !rest.is_empty() => Ok(()),
			Some(_) => Err(format!("database.url must name a file after {SCHEME}")),
			None => Err(format!(
				"database.url must use the {SCHEME} scheme, got {:?}",
				self.url
			)),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	/// Surrounding whitespace from env values is dropped.
	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self
				.url
				.map(|url| url.trim().to_string())
				.unwrap_or_else(|| DEFAULT_URL.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolved(url: &str) -> DatabaseConfig {
		DatabaseConfigLayer {
			url: Some(url.to_string()),
		}
		.finalize()
	}

	#[test]
	fn default_is_local_file_and_valid() {
		let config = DatabaseConfigLayer::default().finalize();
		assert_eq!(config.url, "sqlite:./hydia.db");
		assert!(config.validate().is_ok());
	}

	#[test]
	fn later_layer_wins_and_is_trimmed() {
		let mut layer = DatabaseConfigLayer {
			url: Some("sqlite:./first.db".to_string()),
		};
		layer.merge(DatabaseConfigLayer {
			url: Some(" sqlite:/var/lib/hydia/vault.db\n".to_string()),
		});
		layer.merge(DatabaseConfigLayer::default());
		assert_eq!(layer.finalize().url, "sqlite:/var/lib/hydia/vault.db");
	}

	#[test]
	fn in_memory_url_is_accepted() {
		assert!(resolved("sqlite::memory:").validate().is_ok());
	}

	#[test]
	fn non_sqlite_urls_are_rejected() {
		for url in ["", "   ", "sqlite:", "postgres://localhost/hydia", "./hydia.db"] {
			assert!(resolved(url).validate().is_err(), "{url:?} should be rejected");
		}
	}
}
