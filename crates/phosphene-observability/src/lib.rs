// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # phosphene-observability
//!
//! Logging setup shared by the phosphene binaries and tests, with per-crate
//! debug flags.
//!
//! ## Features
//! - `file-logging`: per-run JSON log files next to the console output

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known phosphene crate names for debug flags (also the `tracing` targets
/// they log under)
pub const KNOWN_CRATES: &[&str] = &[
    "phosphene",
    "phosphene-models",
    "phosphene-config",
    "phosphene-structures",
];
