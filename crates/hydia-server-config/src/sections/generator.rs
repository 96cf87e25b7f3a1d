// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default password generation policy.
//!
//! Used when a caller asks for a password without supplying a policy. Range
//! checks happen when the policy is built at startup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
	pub length: usize,
	pub include_uppercase: bool,
	pub include_lowercase: bool,
	pub include_numbers: bool,
	pub include_symbols: bool,
	pub exclude_similar: bool,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			length: 16,
			include_uppercase: true,
			include_lowercase: true,
			include_numbers: true,
			include_symbols: true,
			exclude_similar: false,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneratorConfigLayer {
	pub length: Option<usize>,
	pub include_uppercase: Option<bool>,
	pub include_lowercase: Option<bool>,
	pub include_numbers: Option<bool>,
	pub include_symbols: Option<bool>,
	pub exclude_similar: Option<bool>,
}

impl GeneratorConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.length.is_some() {
			self.length = other.length;
		}
		if other.include_uppercase.is_some() {
			self.include_uppercase = other.include_uppercase;
		}
		if other.include_lowercase.is_some() {
			self.include_lowercase = other.include_lowercase;
		}
		if other.include_numbers.is_some() {
			self.include_numbers = other.include_numbers;
		}
		if other.include_symbols.is_some() {
			self.include_symbols = other.include_symbols;
		}
		if other.exclude_similar.is_some() {
			self.exclude_similar = other.exclude_similar;
		}
	}

	pub fn finalize(self) -> GeneratorConfig {
		let defaults = GeneratorConfig::default();
		GeneratorConfig {
			length: self.length.unwrap_or(defaults.length),
			include_uppercase: self.include_uppercase.unwrap_or(defaults.include_uppercase),
			include_lowercase: self.include_lowercase.unwrap_or(defaults.include_lowercase),
			include_numbers: self.include_numbers.unwrap_or(defaults.include_numbers),
			include_symbols: self.include_symbols.unwrap_or(defaults.include_symbols),
			exclude_similar: self.exclude_similar.unwrap_or(defaults.exclude_similar),
		}
	}
}
