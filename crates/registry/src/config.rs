//! Registry configuration.
//!
//! [`RegistryConfig`] carries everything a caching registry needs apart from
//! its directory handle. Build it in code with [`RegistryConfig::builder`]
//! or deserialize it from a configuration file; durations use
//! [`humantime`](https://docs.rs/humantime) syntax.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use adtoken_registry::RegistryConfig;
//!
//! let config = RegistryConfig::builder()
//!     .base_dn("OU=Groups")
//!     .context_base_dn("DC=example,DC=com")
//!     .cache_null_values(true)
//!     .time_to_idle(Duration::from_secs(600))
//!     .build()?;
//! assert_eq!(config.time_to_live(), Duration::from_secs(86_400));
//! # Ok::<(), adtoken_registry::ConfigError>(())
//! ```
//!
//! ```
//! use adtoken_registry::RegistryConfig;
//!
//! let config: RegistryConfig = serde_json::from_str(
//!     r#"{ "base_dn": "OU=Groups", "time_to_live": "2h", "time_to_idle": "30m" }"#,
//! )?;
//! config.validate()?;
//! assert!(!config.cache_null_values());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{cache::ExpiryPolicy, error::ConfigError};

/// Default absolute lifetime of a cache entry: one day.
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(86_400);

/// Default idle timeout of a cache entry: twelve hours.
pub const DEFAULT_TIME_TO_IDLE: Duration = Duration::from_secs(43_200);

/// Default number of entries a cache holds.
pub const DEFAULT_MAX_CAPACITY: u64 = 100;

/// Shortest accepted lifetime or idle timeout.
pub const MIN_EXPIRY: Duration = Duration::from_secs(1);

/// Configuration for a [`CachingRegistry`](crate::CachingRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Search base, relative to the directory's context base.
    #[serde(default)]
    pub(crate) base_dn: String,

    /// Context base of the directory connection.
    #[serde(default)]
    pub(crate) context_base_dn: String,

    /// Remember "not found" results.
    #[serde(default)]
    pub(crate) cache_null_values: bool,

    /// Absolute lifetime of a cache entry.
    #[serde(with = "humantime_serde", default = "default_time_to_live")]
    pub(crate) time_to_live: Duration,

    /// Idle timeout of a cache entry.
    #[serde(with = "humantime_serde", default = "default_time_to_idle")]
    pub(crate) time_to_idle: Duration,

    /// Maximum number of cached SIDs.
    #[serde(default = "default_max_capacity")]
    pub(crate) max_capacity: u64,
}

fn default_time_to_live() -> Duration {
    DEFAULT_TIME_TO_LIVE
}

fn default_time_to_idle() -> Duration {
    DEFAULT_TIME_TO_IDLE
}

fn default_max_capacity() -> u64 {
    DEFAULT_MAX_CAPACITY
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_dn: String::new(),
            context_base_dn: String::new(),
            cache_null_values: false,
            time_to_live: DEFAULT_TIME_TO_LIVE,
            time_to_idle: DEFAULT_TIME_TO_IDLE,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

#[bon::bon]
impl RegistryConfig {
    /// Creates a new configuration, validating every field.
    ///
    /// # Optional Fields
    ///
    /// * `base_dn` - Search base (default: empty, the context base itself).
    /// * `context_base_dn` - Context base of the connection (default: empty).
    /// * `cache_null_values` - Cache "not found" results (default: false).
    /// * `time_to_live` - Absolute entry lifetime (default: 1 day).
    /// * `time_to_idle` - Entry idle timeout (default: 12 hours).
    /// * `max_capacity` - Maximum cached SIDs (default: 100).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if either duration is under one
    /// second or `max_capacity` is 0.
    #[builder]
    pub fn new(
        #[builder(default, into)] base_dn: String,
        #[builder(default, into)] context_base_dn: String,
        #[builder(default)] cache_null_values: bool,
        #[builder(default = DEFAULT_TIME_TO_LIVE)] time_to_live: Duration,
        #[builder(default = DEFAULT_TIME_TO_IDLE)] time_to_idle: Duration,
        #[builder(default = DEFAULT_MAX_CAPACITY)] max_capacity: u64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            base_dn,
            context_base_dn,
            cache_null_values,
            time_to_live,
            time_to_idle,
            max_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its minimum.
    ///
    /// Deserialized configurations are not validated on their own; the
    /// registry builder calls this before using one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_duration("time_to_live", self.time_to_live)?;
        check_duration("time_to_idle", self.time_to_idle)?;
        if self.max_capacity == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_capacity",
                value: self.max_capacity.to_string(),
                min: "1".to_owned(),
            });
        }
        Ok(())
    }

    /// Returns the search base.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// Returns the context base of the directory connection.
    ///
    /// The registry does not use this itself; directory resolvers append it
    /// to the names they return.
    #[must_use]
    pub fn context_base_dn(&self) -> &str {
        &self.context_base_dn
    }

    /// Returns whether "not found" results are cached.
    #[must_use]
    pub fn cache_null_values(&self) -> bool {
        self.cache_null_values
    }

    /// Returns the absolute entry lifetime.
    #[must_use]
    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    /// Returns the entry idle timeout.
    #[must_use]
    pub fn time_to_idle(&self) -> Duration {
        self.time_to_idle
    }

    /// Returns the maximum number of cached SIDs.
    #[must_use]
    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    /// Returns the expiry policy described by this configuration.
    #[must_use]
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.time_to_live, self.time_to_idle)
    }
}

fn check_duration(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value < MIN_EXPIRY {
        return Err(ConfigError::BelowMinimum {
            field,
            value: format!("{}ms", value.as_millis()),
            min: "1s".to_owned(),
        });
    }
    Ok(())
}
