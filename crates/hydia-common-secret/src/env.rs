// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from the environment.
//!
//! A secret named `VAR` may be supplied either directly in `VAR` or as a file
//! path in `VAR_FILE` (Docker/Kubernetes secret mounts). The file form wins
//! when both are set. A single trailing newline is stripped from file
//! contents.

use std::path::PathBuf;
use std::{env, fs};

use thiserror::Error;
use tracing::debug;

use crate::SecretString;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load `var` from the environment, preferring `{var}_FILE`.
///
/// Empty direct values are treated as unset.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;

		debug!(var = %file_var, "loaded secret from file");
		let value = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(value)));
	}

	match env::var(var) {
		Ok(value) if !value.is_empty() => Ok(Some(SecretString::new(value))),
		_ => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	// Each test uses its own variable name; the process environment is shared
	// between test threads.

	#[test]
	fn reads_direct_value() {
		env::set_var("HYDIA_TEST_DIRECT_KEY", "direct-value");
		let secret = load_secret_env("HYDIA_TEST_DIRECT_KEY").unwrap().unwrap();
		assert_eq!(secret.expose(), "direct-value");
		env::remove_var("HYDIA_TEST_DIRECT_KEY");
	}

	#[test]
	fn file_variant_wins_and_strips_one_newline() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();

		env::set_var("HYDIA_TEST_FILE_KEY", "direct-value");
		env::set_var("HYDIA_TEST_FILE_KEY_FILE", file.path());

		let secret = load_secret_env("HYDIA_TEST_FILE_KEY").unwrap().unwrap();
		assert_eq!(secret.expose(), "from-file");

		env::remove_var("HYDIA_TEST_FILE_KEY");
		env::remove_var("HYDIA_TEST_FILE_KEY_FILE");
	}

	#[test]
	fn empty_file_path_is_error() {
		env::set_var("HYDIA_TEST_EMPTY_PATH_FILE", "");
		let err = load_secret_env("HYDIA_TEST_EMPTY_PATH").unwrap_err();
		assert!(matches!(err, SecretEnvError::EmptyPath { .. }));
		env::remove_var("HYDIA_TEST_EMPTY_PATH_FILE");
	}

	#[test]
	fn missing_file_is_io_error() {
		env::set_var("HYDIA_TEST_MISSING_FILE_FILE", "/nonexistent/hydia/key");
		let err = load_secret_env("HYDIA_TEST_MISSING_FILE").unwrap_err();
		assert!(matches!(err, SecretEnvError::Io { .. }));
		env::remove_var("HYDIA_TEST_MISSING_FILE_FILE");
	}

	#[test]
	fn unset_is_none() {
		assert!(load_secret_env("HYDIA_TEST_NEVER_SET").unwrap().is_none());
	}

	#[test]
	fn empty_direct_value_is_none() {
		env::set_var("HYDIA_TEST_BLANK_KEY", "");
		assert!(load_secret_env("HYDIA_TEST_BLANK_KEY").unwrap().is_none());
		env::remove_var("HYDIA_TEST_BLANK_KEY");
	}
}
