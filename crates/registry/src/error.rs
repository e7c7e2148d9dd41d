//! Error types for group resolution and registry configuration.
//!
//! Three layers of failure are kept apart:
//!
//! - [`DirectoryError`] - the directory service could not answer a lookup
//! - [`ConfigError`] - a registry or cache was configured with invalid values
//! - [`RegistryError`] - what [`TokenGroupsRegistry`](crate::TokenGroupsRegistry) operations
//!   return, wrapping the two above
//!
//! A malformed SID is *not* an error at this level: the registry logs it and
//! reports "no group". Callers that need the codec failure itself should use
//! [`adtoken_sid::Sid::decode`] directly.
//!
//! # Example
//!
//! ```
//! use adtoken_registry::{DirectoryError, RegistryError};
//!
//! let err: RegistryError = DirectoryError::timeout().into();
//! assert!(err.is_transient());
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
///
/// `Arc` rather than `Box` so that [`DirectoryError`] stays `Clone`.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors a [`DirectoryResolver`](crate::DirectoryResolver) can report.
///
/// Implementations map their transport's failures onto these variants so the
/// registry can log and classify them uniformly.
///
/// # Non-exhaustive
///
/// New variants may be added in minor releases. Match expressions must
/// include a wildcard arm.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DirectoryError {
    /// The directory service could not be reached.
    #[error("Directory connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
        /// The underlying error that caused this failure.
        #[source]
        source: Option<BoxError>,
    },

    /// The lookup exceeded its time limit.
    #[error("Directory operation timeout")]
    Timeout,

    /// The directory answered with something the resolver cannot use, such
    /// as an entry without a distinguished name.
    #[error("Directory protocol error: {message}")]
    Protocol {
        /// Description of the unexpected response.
        message: String,
    },

    /// Any other directory-side failure.
    #[error("Directory internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
        /// The underlying error that caused this failure.
        #[source]
        source: Option<BoxError>,
    },
}

impl DirectoryError {
    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Connection` error with a message and source error.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Creates a new `Protocol` error with the given message.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol { message: message.into() }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Returns `true` when retrying the same lookup later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout)
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required component was not supplied to a builder.
    #[error("missing required field: {field}")]
    Missing {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A value is below its allowed minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Name of the offending field.
        field: &'static str,
        /// The supplied value, formatted for display.
        value: String,
        /// The minimum accepted value, formatted for display.
        min: String,
    },

    /// A value is malformed for reasons other than its magnitude.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The directory lookup failed. Nothing was cached.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The registry was constructed with an invalid configuration.
    #[error("Registry configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RegistryError {
    /// Returns `true` when the failure came from a transient directory
    /// condition.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Directory(err) => err.is_transient(),
            Self::Config(_) => false,
        }
    }
}
