// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always on. With the `file-logging` feature and a log
//! directory, every run also writes a JSON log:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── phosphene.log
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Console log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Keeps file writers alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder holding this run's log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Name of the per-run log folder, e.g. `run_20250101_120000`
pub fn run_folder_name(now: DateTime<Utc>) -> String {
    format!("run_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber
///
/// # Arguments
/// * `debug_flags` - per-crate debug flags and base level
/// * `format` - console format
/// * `log_dir` - base directory for per-run JSON logs (`file-logging` only)
///
/// # Errors
///
/// Invalid filter directives, an unwritable log directory, or a subscriber
/// that is already installed
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    format: LogFormat,
    log_dir: Option<PathBuf>,
) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string();
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(env_filter)
            .boxed(),
    };
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guards, run_dir) = match &log_dir {
        Some(base) => {
            let run_folder = base.join(run_folder_name(Utc::now()));
            std::fs::create_dir_all(&run_folder).with_context(|| {
                format!("Failed to create log directory: {}", run_folder.display())
            })?;
            let appender = tracing_appender::rolling::never(&run_folder, "phosphene.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let file_filter = EnvFilter::try_new(&filter)
                .with_context(|| format!("Invalid log filter: {}", filter))?;
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_filter(file_filter)
                    .boxed(),
            );
            (vec![guard], Some(run_folder))
        }
        None => (Vec::new(), None),
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    #[cfg(feature = "file-logging")]
    {
        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_dir,
        })
    }

    #[cfg(not(feature = "file-logging"))]
    {
        if let Some(dir) = log_dir {
            tracing::warn!(
                target: "phosphene",
                "Log directory {} ignored: built without the file-logging feature",
                dir.display()
            );
        }
        Ok(LoggingGuard { log_dir: None })
    }
}

/// Console-only logging at the flags' levels
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, LogFormat::Text, None)
}
