// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hydia Vault
//!
//! This crate provides the secret-handling core of Hydia:
//!
//! - **Encryption**: AES-256-GCM with a fresh random nonce per value
//! - **Password Generation**: policy-driven, CSPRNG-backed, every enabled
//!   character class guaranteed to appear
//! - **Secret Lifecycle**: create, reveal, update, delete, list and share,
//!   each behind the tenant permission gate
//!
//! # Security Design
//!
//! - All plaintext uses [`SecretString`](hydia_common_secret::SecretString) to prevent logging
//! - Stores only ever receive [`Ciphertext`]
//! - A missing or malformed key is a startup error, never a fallback
//! - Decryption either authenticates or fails; there is no partial output
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hydia_common_secret::SecretString;
//! use hydia_server_auth::{
//! 	InMemoryMembershipStore, MembershipService, PermissionGate, PrincipalId, TenantId,
//! };
//! use hydia_server_vault::{
//! 	generate_key, CreateSecretInput, InMemorySecretStore, SecretCipher, VaultService,
//! };
//!
//! # tokio_test::block_on(async {
//! let memberships = Arc::new(InMemoryMembershipStore::new());
//! let members = MembershipService::new(Arc::clone(&memberships));
//! let vault = VaultService::new(
//! 	PermissionGate::new(memberships),
//! 	Arc::new(InMemorySecretStore::new()),
//! 	SecretCipher::new(generate_key()),
//! );
//!
//! let tenant = TenantId::generate();
//! let owner = PrincipalId::generate();
//! members.bootstrap_owner(tenant, owner).await.unwrap();
//!
//! let input = CreateSecretInput::password("mail", SecretString::from("Tr0ub4dor&3"));
//! let id = vault.create_secret(tenant, owner, input).await.unwrap();
//! let revealed = vault.reveal_secret(tenant, owner, id).await.unwrap();
//! assert_eq!(revealed.value.expose(), "Tr0ub4dor&3");
//! # });
//! ```

pub mod cipher;
pub mod error;
pub mod generator;
pub mod service;
pub mod store;
pub mod types;

pub use cipher::{decrypt, encode_key, encrypt, generate_key, Ciphertext, SecretCipher, KEY_SIZE, NONCE_SIZE};
pub use error::{CryptoError, StoreError, ValidationError, VaultError, VaultResult};
pub use generator::{
	generate, generate_with_rng, CharacterClass, GenerationPolicy, MAX_PASSWORD_LENGTH,
	MIN_PASSWORD_LENGTH, SIMILAR_CHARACTERS, SYMBOLS,
};
pub use service::{VaultService, MAX_SECRET_NAME_LENGTH, MAX_SECRET_VALUE_SIZE};
pub use store::{InMemorySecretStore, SecretStore, SqliteSecretStore};
pub use types::{
	CreateSecretInput, NewSecret, RevealedSecret, SecretId, SecretKind, SecretMetadata,
	SecretRecord,
};
