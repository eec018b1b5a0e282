//! Error types for sitestack core
//!
//! Three layers, each wrapping the one below:
//! - [`ConfigError`]: stack configuration could not be loaded or is incomplete
//! - [`StackError`]: a declaration was rejected
//! - [`SiteError`]: anything the site entry points can fail with, including
//!   engine failures carried verbatim from the kernel

use sitestack_kernel::{EngineError, GraphBuilderError, SubmitError, Urn, ValidationError};
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Stack file does not exist
    #[error("stack configuration not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Stack file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stack file is not valid TOML or has the wrong shape
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    /// A required key is absent
    #[error("missing required configuration key '{0}'")]
    MissingKey(String),

    /// A secure value was requested as plain text
    #[error("configuration key '{0}' is secret; read it with require_secret")]
    SecretAsPlain(String),

    /// A value is present but unusable
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Declaration errors
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("invalid AWS region '{0}'")]
    InvalidRegion(String),

    #[error("invalid {field} for {resource}: {reason}")]
    InvalidArgument {
        resource: String,
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Builder(#[from] GraphBuilderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors from the site entry points
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("declaration error: {0}")]
    Stack(#[from] StackError),

    #[error("deployment failed: {0}")]
    Submit(#[from] SubmitError),
}

impl SiteError {
    /// Failed before anything reached the engine
    #[inline]
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, SiteError::Config(_) | SiteError::Stack(_))
    }

    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SiteError::Submit(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Resource the engine failed on
    #[must_use]
    pub fn failed_resource(&self) -> Option<&Urn> {
        match self {
            SiteError::Submit(err) => err.failed_resource(),
            _ => None,
        }
    }

    /// Engine diagnostic, untouched
    #[must_use]
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            SiteError::Submit(err) => err.engine_error(),
            _ => None,
        }
    }
}
