// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hydia server: configuration, startup validation and service wiring.

pub mod error;
pub mod logging;
pub mod state;
pub mod version;

pub use error::StartupError;
pub use logging::init_tracing;
pub use state::{generation_policy, AppState, Vault};
