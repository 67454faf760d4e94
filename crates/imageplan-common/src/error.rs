//! Unified error types for the imageplan workspace.
//!
//! Every failure is fatal for the current compilation: no partial plan is
//! ever produced, and nothing is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ImagePlanError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required option is missing or malformed.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid option.
        message: String,
    },

    /// The manifest contradicts itself or the discovered test catalog.
    #[error("manifest inconsistency: {message}")]
    ManifestInconsistency {
        /// Description of the inconsistency.
        message: String,
    },

    /// The manifest file could not be parsed.
    #[error("malformed manifest {path}: {source}")]
    Manifest {
        /// Path of the manifest file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// A plan could not be rendered to text.
    #[error("failed to render plan as {format}")]
    Render {
        /// Name of the output format.
        format: &'static str,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl ImagePlanError {
    /// Shorthand for a [`ImagePlanError::Config`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Shorthand for a [`ImagePlanError::ManifestInconsistency`] error.
    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::ManifestInconsistency {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ImagePlanError>;
