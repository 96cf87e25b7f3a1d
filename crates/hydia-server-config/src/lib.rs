// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for Hydia server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Consistent environment variable naming (`HYDIA_SERVER_*`)
//! - The master encryption key, loaded from the environment only
//!
//! # Usage
//!
//! ```ignore
//! use hydia_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("database at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub vault: VaultConfig,
	pub generator: GeneratorConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`HYDIA_SERVER_*`)
/// 2. Config file (`/etc/hydia/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let vault = layer.vault.unwrap_or_default().finalize();
	let generator = layer.generator.unwrap_or_default().finalize();

	validate_config(&database, &generator)?;

	info!(
		database = %database.url,
		log_format = %logging.format,
		encryption_key_configured = vault.encryption_key.is_some(),
		generator_length = generator.length,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		database,
		logging,
		vault,
		generator,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	database: &DatabaseConfig,
	generator: &GeneratorConfig,
) -> Result<(), ConfigError> {
	database.validate().map_err(ConfigError::Validation)?;

	if !(generator.include_uppercase
		|| generator.include_lowercase
		|| generator.include_numbers
		|| generator.include_symbols)
	{
		return Err(ConfigError::Validation(
			"generator must enable at least one character class".to_string(),
		));
	}

	Ok(())
}
