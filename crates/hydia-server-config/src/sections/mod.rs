// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for hydia-server.

pub mod database;
pub mod generator;
pub mod logging;
pub mod vault;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use generator::{GeneratorConfig, GeneratorConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use vault::{VaultConfig, VaultConfigLayer, ENCRYPTION_KEY_ENV};
