// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use hydia_common_secret::load_secret_env;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	DatabaseConfigLayer, GeneratorConfigLayer, LogFormat, LoggingConfigLayer, VaultConfigLayer,
	ENCRYPTION_KEY_ENV,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/hydia/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: HYDIA_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()?),
			vault: Some(load_vault_from_env()?),
			generator: Some(load_generator_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("HYDIA_SERVER_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("HYDIA_SERVER_LOG_FORMAT") {
		Some(v) => Some(
			v.parse::<LogFormat>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "HYDIA_SERVER_LOG_FORMAT".to_string(),
					message,
				})?,
		),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("HYDIA_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_vault_from_env() -> Result<VaultConfigLayer, ConfigError> {
	Ok(VaultConfigLayer {
		encryption_key: load_secret_env(ENCRYPTION_KEY_ENV)
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
	})
}

fn load_generator_from_env() -> Result<GeneratorConfigLayer, ConfigError> {
	Ok(GeneratorConfigLayer {
		length: env_usize("HYDIA_SERVER_GENERATOR_LENGTH")?,
		include_uppercase: env_bool("HYDIA_SERVER_GENERATOR_UPPERCASE"),
		include_lowercase: env_bool("HYDIA_SERVER_GENERATOR_LOWERCASE"),
		include_numbers: env_bool("HYDIA_SERVER_GENERATOR_NUMBERS"),
		include_symbols: env_bool("HYDIA_SERVER_GENERATOR_SYMBOLS"),
		exclude_similar: env_bool("HYDIA_SERVER_GENERATOR_EXCLUDE_SIMILAR"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.database.is_none());
		assert!(layer.vault.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/server.toml").load().unwrap();
		assert!(layer.database.is_none());
	}

	#[test]
	fn test_toml_source_reads_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[database]
url = "sqlite:/tmp/hydia-test.db"

[generator]
length = 32
exclude_similar = true
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.database.unwrap().url,
			Some("sqlite:/tmp/hydia-test.db".to_string())
		);
		let generator = layer.generator.unwrap();
		assert_eq!(generator.length, Some(32));
		assert_eq!(generator.exclude_similar, Some(true));
	}

	#[test]
	fn test_toml_source_reports_parse_errors_with_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[generator]\nlength = \"long\"").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
		assert!(err.to_string().contains(&file.path().display().to_string()));
	}

	#[test]
	fn test_env_usize_rejects_garbage() {
		std::env::set_var("HYDIA_CONFIG_TEST_USIZE_GARBAGE", "twelve");
		let err = env_usize("HYDIA_CONFIG_TEST_USIZE_GARBAGE").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
		std::env::remove_var("HYDIA_CONFIG_TEST_USIZE_GARBAGE");
	}

	#[test]
	fn test_env_bool_accepts_one_and_true() {
		std::env::set_var("HYDIA_CONFIG_TEST_BOOL_ONE", "1");
		std::env::set_var("HYDIA_CONFIG_TEST_BOOL_TRUE", "TRUE");
		std::env::set_var("HYDIA_CONFIG_TEST_BOOL_NO", "no");
		assert_eq!(env_bool("HYDIA_CONFIG_TEST_BOOL_ONE"), Some(true));
		assert_eq!(env_bool("HYDIA_CONFIG_TEST_BOOL_TRUE"), Some(true));
		assert_eq!(env_bool("HYDIA_CONFIG_TEST_BOOL_NO"), Some(false));
		assert_eq!(env_bool("HYDIA_CONFIG_TEST_BOOL_UNSET"), None);
	}
}
