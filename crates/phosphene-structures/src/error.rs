// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error type shared by every phosphene crate.

/// Result type for phosphene operations
pub type PerceptResult<T> = Result<T, PerceptError>;

/// Errors that can occur while building models or predicting percepts
///
/// None of these are transient: every variant describes a programming or
/// configuration mistake and is surfaced to the caller immediately.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PerceptError {
    /// Bad configuration or argument (non-positive counts, non-finite coordinates, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The model was queried before a successful `build`
    #[error("Model not built: {0}")]
    NotBuilt(String),

    /// A collaborator does not fit the model (unknown electrode, wrong eye, ...)
    #[error("Incompatible input: {0}")]
    IncompatibleInput(String),

    /// Internal error indicating a bug
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PerceptError {
    /// Shorthand used by validation code
    pub fn invalid(msg: impl Into<String>) -> Self {
        PerceptError::InvalidParameter(msg.into())
    }
}

/// Fail with `InvalidParameter` unless `value` is a finite real
pub fn ensure_finite(name: &str, value: f64) -> PerceptResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PerceptError::InvalidParameter(format!(
            "{} must be a finite number, got {}",
            name, value
        )))
    }
}
