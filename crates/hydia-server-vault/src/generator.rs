// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy-driven random password generation.
//!
//! [`generate_with_rng`] is a pure function of the policy and the random
//! source, which lets tests drive it with a seeded RNG. [`generate`] uses the
//! operating system CSPRNG.
//!
//! 1. validate the policy
//! 2. build the active charset (union of enabled classes, minus similar
//!    characters when asked)
//! 3. draw `length` characters uniformly from it
//! 4. for each enabled class, overwrite one position with a character of
//!    that class; positions are distinct, so no class displaces another
//! 5. shuffle

use rand::rngs::OsRng;
use rand::seq::{index, SliceRandom};
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Characters dropped when `exclude_similar` is set.
pub const SIMILAR_CHARACTERS: &str = "il1Lo0O";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
	Uppercase,
	Lowercase,
	Digit,
	Symbol,
}

impl CharacterClass {
	pub fn all() -> &'static [CharacterClass] {
		&[
			CharacterClass::Uppercase,
			CharacterClass::Lowercase,
			CharacterClass::Digit,
			CharacterClass::Symbol,
		]
	}

	pub fn alphabet(&self) -> &'static str {
		match self {
			CharacterClass::Uppercase => UPPERCASE,
			CharacterClass::Lowercase => LOWERCASE,
			CharacterClass::Digit => DIGITS,
			CharacterClass::Symbol => SYMBOLS,
		}
	}

	pub fn contains(&self, c: char) -> bool {
		self.alphabet().contains(c)
	}

	fn pool(&self, exclude_similar: bool) -> Vec<char> {
		self
			.alphabet()
			.chars()
			.filter(|c| !exclude_similar || !SIMILAR_CHARACTERS.contains(*c))
			.collect()
	}
}

impl fmt::Display for CharacterClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CharacterClass::Uppercase => write!(f, "uppercase"),
			CharacterClass::Lowercase => write!(f, "lowercase"),
			CharacterClass::Digit => write!(f, "digit"),
			CharacterClass::Symbol => write!(f, "symbol"),
		}
	}
}

/// Declarative constraints for a generated password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationPolicy {
	pub length: usize,
	pub include_uppercase: bool,
	pub include_lowercase: bool,
	pub include_numbers: bool,
	pub include_symbols: bool,
	pub exclude_similar: bool,
}

impl Default for GenerationPolicy {
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

impl GenerationPolicy {
	pub fn validate(&self) -> Result<(), ValidationError> {
		if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&self.length) {
			return Err(ValidationError::LengthOutOfRange {
				length: self.length,
				min: MIN_PASSWORD_LENGTH,
				max: MAX_PASSWORD_LENGTH,
			});
		}
		if self.enabled_classes().is_empty() {
			return Err(ValidationError::NoCharacterClasses);
		}
		Ok(())
	}

	pub fn enabled_classes(&self) -> Vec<CharacterClass> {
		let flags = [
			(CharacterClass::Uppercase, self.include_uppercase),
			(CharacterClass::Lowercase, self.include_lowercase),
			(CharacterClass::Digit, self.include_numbers),
			(CharacterClass::Symbol, self.include_symbols),
		];
		flags
			.into_iter()
			.filter_map(|(class, enabled)| enabled.then_some(class))
			.collect()
	}

	/// The characters a password under this policy is drawn from.
	pub fn charset(&self) -> Vec<char> {
		self
			.enabled_classes()
			.iter()
			.flat_map(|class| class.pool(self.exclude_similar))
			.collect()
	}

	/// Upper bound on the password's entropy: `length * log2(|charset|)`.
	pub fn entropy_bits(&self) -> f64 {
		let size = self.charset().len();
		if size == 0 {
			return 0.0;
		}
		self.length as f64 * (size as f64).log2()
	}
}

/// Generate a password with the supplied random source.
pub fn generate_with_rng<R>(policy: &GenerationPolicy, rng: &mut R) -> Result<String, ValidationError>
where
	R: RngCore + CryptoRng + ?Sized,
{
	policy.validate()?;

	let charset = policy.charset();
	let mut chars: Vec<char> = (0..policy.length)
		.map(|_| charset[rng.gen_range(0..charset.len())])
		.collect();

	let classes = policy.enabled_classes();
	let positions = index::sample(rng, policy.length, classes.len());
	for (class, position) in classes.iter().zip(positions.iter()) {
		let pool = class.pool(policy.exclude_similar);
		chars[position] = pool[rng.gen_range(0..pool.len())];
	}

	chars.shuffle(rng);
	Ok(chars.into_iter().collect())
}

/// Generate a password using the operating system CSPRNG.
pub fn generate(policy: &GenerationPolicy) -> Result<String, ValidationError> {
	generate_with_rng(policy, &mut OsRng)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn only(class: CharacterClass, length: usize) -> GenerationPolicy {
		GenerationPolicy {
			length,
			include_uppercase: class == CharacterClass::Uppercase,
			include_lowercase: class == CharacterClass::Lowercase,
			include_numbers: class == CharacterClass::Digit,
			include_symbols: class == CharacterClass::Symbol,
			exclude_similar: false,
		}
	}

	mod validation {
		use super::*;

		#[test]
		fn too_short_is_rejected() {
			let policy = GenerationPolicy {
				length: 4,
				..Default::default()
			};
			assert_eq!(
				generate(&policy).unwrap_err(),
				ValidationError::LengthOutOfRange {
					length: 4,
					min: 8,
					max: 128
				}
			);
		}

		#[test]
		fn too_long_is_rejected() {
			let policy = GenerationPolicy {
				length: 129,
				..Default::default()
			};
			assert!(matches!(
				policy.validate(),
				Err(ValidationError::LengthOutOfRange { length: 129, .. })
			));
		}

		#[test]
		fn bounds_are_inclusive() {
			for length in [MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH] {
				let policy = GenerationPolicy {
					length,
					..Default::default()
				};
				assert_eq!(generate(&policy).unwrap().chars().count(), length);
			}
		}

		#[test]
		fn no_classes_is_rejected() {
			let policy = GenerationPolicy {
				length: 16,
				include_uppercase: false,
				include_lowercase: false,
				include_numbers: false,
				include_symbols: false,
				exclude_similar: false,
			};
			assert_eq!(
				generate(&policy).unwrap_err(),
				ValidationError::NoCharacterClasses
			);
		}

		#[test]
		fn policy_deserializes_with_defaults() {
			let policy: GenerationPolicy =
				serde_json::from_str(r#"{"length": 24, "include_symbols": false}"#).unwrap();
			assert_eq!(policy.length, 24);
			assert!(!policy.include_symbols);
			assert!(policy.include_uppercase);
		}
	}

	mod charset {
		use super::*;

		#[test]
		fn exclude_similar_drops_ambiguous_characters() {
			let policy = GenerationPolicy {
				exclude_similar: true,
				..Default::default()
			};
			let charset = policy.charset();
			for c in SIMILAR_CHARACTERS.chars() {
				assert!(!charset.contains(&c), "{c} should be excluded");
			}
			assert_eq!(charset.len(), 26 + 26 + 10 + SYMBOLS.len() - 7);
		}

		#[test]
		fn entropy_grows_with_length() {
			let short = GenerationPolicy {
				length: 8,
				..Default::default()
			};
			let long = GenerationPolicy {
				length: 32,
				..Default::default()
			};
			assert!(long.entropy_bits() > short.entropy_bits());
			let digits = only(CharacterClass::Digit, 10);
			assert!((digits.entropy_bits() - 10.0 * 10f64.log2()).abs() < 1e-9);
		}
	}

	mod generation {
		use super::*;

		#[test]
		fn seeded_rng_is_reproducible() {
			let policy = GenerationPolicy::default();
			let a = generate_with_rng(&policy, &mut StdRng::seed_from_u64(7)).unwrap();
			let b = generate_with_rng(&policy, &mut StdRng::seed_from_u64(7)).unwrap();
			assert_eq!(a, b);
		}

		#[test]
		fn no_symbols_when_disabled() {
			let policy = GenerationPolicy {
				length: 16,
				include_symbols: false,
				..Default::default()
			};
			for _ in 0..50 {
				let pw = generate(&policy).unwrap();
				assert!(!pw.chars().any(|c| CharacterClass::Symbol.contains(c)));
			}
		}

		#[test]
		fn single_class_policy_uses_only_that_class() {
			for class in CharacterClass::all() {
				let pw = generate(&only(*class, 12)).unwrap();
				assert!(pw.chars().all(|c| class.contains(c)), "{pw} for {class}");
			}
		}

		#[test]
		fn minimum_length_with_all_classes_covers_each() {
			let policy = GenerationPolicy {
				length: MIN_PASSWORD_LENGTH,
				exclude_similar: true,
				..Default::default()
			};
			for seed in 0..200 {
				let pw = generate_with_rng(&policy, &mut StdRng::seed_from_u64(seed)).unwrap();
				for class in CharacterClass::all() {
					assert!(pw.chars().any(|c| class.contains(c)), "{pw} lacks {class}");
				}
				assert!(!pw.chars().any(|c| SIMILAR_CHARACTERS.contains(c)));
			}
		}
	}

	fn arb_policy() -> impl Strategy<Value = GenerationPolicy> {
		(
			MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH,
			any::<[bool; 4]>(),
			any::<bool>(),
		)
			.prop_filter("at least one class", |(_, flags, _)| flags.iter().any(|f| *f))
			.prop_map(|(length, flags, exclude_similar)| GenerationPolicy {
				length,
				include_uppercase: flags[0],
				include_lowercase: flags[1],
				include_numbers: flags[2],
				include_symbols: flags[3],
				exclude_similar,
			})
	}

	proptest! {
		#[test]
		fn prop_length_matches_policy(policy in arb_policy(), seed in any::<u64>()) {
			let pw = generate_with_rng(&policy, &mut StdRng::seed_from_u64(seed)).unwrap();
			prop_assert_eq!(pw.chars().count(), policy.length);
		}

		#[test]
		fn prop_enabled_classes_are_covered(policy in arb_policy(), seed in any::<u64>()) {
			let pw = generate_with_rng(&policy, &mut StdRng::seed_from_u64(seed)).unwrap();
			for class in policy.enabled_classes() {
				prop_assert!(pw.chars().any(|c| class.contains(c)), "{} lacks {}", pw, class);
			}
		}

		#[test]
		fn prop_disabled_classes_are_absent(policy in arb_policy(), seed in any::<u64>()) {
			let pw = generate_with_rng(&policy, &mut StdRng::seed_from_u64(seed)).unwrap();
			let enabled = policy.enabled_classes();
			for class in CharacterClass::all().iter().filter(|c| !enabled.contains(c)) {
				prop_assert!(!pw.chars().any(|c| class.contains(c)), "{} has {}", pw, class);
			}
		}

		#[test]
		fn prop_output_stays_within_charset(policy in arb_policy(), seed in any::<u64>()) {
			let charset = policy.charset();
			let pw = generate_with_rng(&policy, &mut StdRng::seed_from_u64(seed)).unwrap();
			prop_assert!(pw.chars().all(|c| charset.contains(&c)));
		}
	}
}
