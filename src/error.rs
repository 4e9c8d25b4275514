//! Error types.
//!
//! - [`FitError`] is what the engine returns. Every variant is a recoverable
//!   value; the caller decides whether to retry with another config or capture.
//! - [`AppError`] is the binary boundary: a message plus a process exit code.

use thiserror::Error;

/// Failure kinds of a single `fit` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Fewer usable points than the configured minimum.
    #[error("insufficient samples: {found} points (minimum {required})")]
    InsufficientSamples { found: usize, required: usize },

    /// Points (or the refined inlier set) cannot determine the primitive.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The best RANSAC candidate never reached the consensus floor.
    #[error("fit did not converge: best candidate had {inliers} inliers (need {required})")]
    FitDidNotConverge { inliers: usize, required: usize },

    /// The up reference could not be resolved.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Pitch/roll are ill-defined for the fitted direction.
    #[error("ambiguous orientation: fitted normal is perpendicular to the reference up vector")]
    AmbiguousOrientation,

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl FitError {
    /// Exit code used when this error terminates the `vfit` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::InvalidConfig(_) | FitError::InvalidReference(_) => 2,
            FitError::InsufficientSamples { .. } | FitError::DegenerateGeometry(_) => 3,
            FitError::FitDidNotConverge { .. } | FitError::AmbiguousOrientation => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
