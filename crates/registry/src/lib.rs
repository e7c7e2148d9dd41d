//! Resolve Active Directory `tokenGroups` SIDs to group distinguished names.
//!
//! A user entry's `tokenGroups` attribute lists every group the user belongs
//! to, transitively, as binary security identifiers. Turning those into
//! group names takes one directory search per SID; this crate wraps that
//! search behind [`TokenGroupsRegistry`] and optionally caches the answers.
//!
//! # Components
//!
//! | Type | Role |
//! |------|------|
//! | [`DirectoryResolver`] | The directory search seam; implement it over your LDAP client |
//! | [`SimpleRegistry`] | Searches the directory on every lookup |
//! | [`CachingRegistry`] | Answers from a [`TokenCache`], searching on a miss |
//! | [`MokaTokenCache`], [`MemoryTokenCache`] | Cache providers with TTL/TTI expiry |
//! | [`MemoryDirectory`] | In-memory directory for tests and development |
//!
//! # Quick Start
//!
//! ```
//! use adtoken_registry::{CachingRegistry, MemoryDirectory, RegistryConfig, TokenGroupsRegistry};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let directory = MemoryDirectory::with_context_base("DC=example,DC=com");
//! directory.insert("CN=Users,CN=Builtin", "S-1-5-32-545".parse().unwrap());
//!
//! let config = RegistryConfig::builder().base_dn("CN=Builtin").build().unwrap();
//! let registry = CachingRegistry::builder().directory(directory).config(config).build().unwrap();
//!
//! let token = [
//!     0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05,
//!     0x20, 0x00, 0x00, 0x00, 0x21, 0x02, 0x00, 0x00,
//! ];
//! let dn = registry.get_dn_from_sid(&token).await.unwrap();
//! assert_eq!(dn.unwrap(), "CN=Users,CN=Builtin,DC=example,DC=com");
//! # });
//! ```
//!
//! # Error Handling
//!
//! Lookups return [`RegistryResult<Option<GroupDn>>`](RegistryResult). A
//! malformed SID is logged and reported as `Ok(None)`; only directory
//! failures surface as errors, and those are never cached.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with a call-counting directory, SID fixtures and
//!   assertion macros. Enable this in `[dev-dependencies]` for integration tests.
//! - **`failpoints`**: Activates the `registry-before-directory-search` fail point.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod caching;
pub mod config;
pub mod directory;
pub mod error;
pub mod filter;
pub mod memory;
pub mod metrics;
pub mod registry;
pub mod simple;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use adtoken_sid::{Sid, SidError};
pub use cache::{
    CacheEntry, CachedGroup, ExpiryPolicy, MemoryTokenCache, MokaTokenCache, TokenCache,
};
pub use caching::{CachingRegistry, CachingRegistryBuilder};
pub use config::{
    DEFAULT_MAX_CAPACITY, DEFAULT_TIME_TO_IDLE, DEFAULT_TIME_TO_LIVE, MIN_EXPIRY, RegistryConfig,
};
pub use directory::DirectoryResolver;
pub use error::{
    BoxError, ConfigError, DirectoryError, DirectoryResult, RegistryError, RegistryResult,
};
pub use filter::{escape_octets, object_sid_filter};
pub use memory::MemoryDirectory;
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use registry::{TokenGroupsRegistry, sid_from_str, sid_from_token};
pub use simple::{SimpleRegistry, SimpleRegistryBuilder};
pub use types::{GroupDn, compose_dn};
