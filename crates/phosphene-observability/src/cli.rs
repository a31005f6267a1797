// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-phosphene-models` and `--debug-all`, plus the
//! `PHOSPHENE_DEBUG` environment variable.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (comma-separated or `all`)
pub const DEBUG_ENV: &str = "PHOSPHENE_DEBUG";

/// Per-crate debug switches plus the level for everything else
///
/// # Example
/// ```rust
/// use phosphene_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-phosphene-models".to_string()]);
/// assert!(flags.is_enabled("phosphene-models"));
/// ```
#[derive(Debug, Clone)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
    /// Level for crates without a debug flag
    pub base_level: String,
}

impl Default for CrateDebugFlags {
    fn default() -> Self {
        Self {
            enabled_crates: BTreeSet::new(),
            base_level: "info".to_string(),
        }
    }
}

impl CrateDebugFlags {
    /// Parse `--debug-{crate}` and `--debug-all`; other arguments are ignored
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                if !crate_name.is_empty() {
                    flags.enabled_crates.insert(crate_name.to_string());
                }
            }
        }
        flags
    }

    /// Add crates from a `PHOSPHENE_DEBUG`-style value
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string());
            }
        }
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    pub fn with_base_level(mut self, level: impl Into<String>) -> Self {
        self.base_level = level.into();
        self
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for flagged crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directives, e.g. `phosphene-models=debug,info`
    pub fn to_filter_string(&self) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|c| format!("{}=debug", c))
            .collect();
        filters.push(self.base_level.clone());
        filters.join(",")
    }
}

/// Flags from the process arguments and `PHOSPHENE_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Help text for the debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {}=all                             Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV,
        DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec![
            "predict_percept".to_string(),
            "--debug-phosphene-models".to_string(),
        ]);
        assert!(flags.is_enabled("phosphene-models"));
        assert!(!flags.is_enabled("phosphene-config"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        flags.merge_env_value(" phosphene-config , ,phosphene");
        assert!(flags.is_enabled("phosphene-config"));
        assert!(flags.is_enabled("phosphene"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-phosphene-models".to_string()])
            .with_base_level("warn");
        assert_eq!(flags.to_filter_string(), "phosphene-models=debug,warn");
        assert_eq!(CrateDebugFlags::default().to_filter_string(), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-phosphene-models".to_string()]);
        assert_eq!(flags.log_level("phosphene-models"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("phosphene"), tracing::Level::INFO);
        assert!(debug_flags_help().contains("phosphene-models"));
    }
}
