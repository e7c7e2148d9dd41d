//! Uncached registry: every lookup is a directory search.

use std::{fmt, sync::Arc};

use adtoken_sid::Sid;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    directory::DirectoryResolver,
    error::{ConfigError, RegistryResult},
    filter::object_sid_filter,
    registry::TokenGroupsRegistry,
    types::GroupDn,
};

/// A [`TokenGroupsRegistry`] that forwards every lookup to its directory.
///
/// Holds no mutable state after construction, so one instance can be shared
/// across any number of concurrent callers.
///
/// # Example
///
/// ```
/// use adtoken_registry::{MemoryDirectory, SimpleRegistry, TokenGroupsRegistry};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let directory = MemoryDirectory::new();
/// directory.insert("CN=Everyone,DC=example,DC=com", "S-1-1-0".parse().unwrap());
///
/// let registry = SimpleRegistry::builder().directory(directory).build().unwrap();
/// let dn = registry.get_dn_from_sid_str("S-1-1-0").await.unwrap();
/// assert_eq!(dn.unwrap(), "CN=Everyone,DC=example,DC=com");
/// # });
/// ```
#[derive(Clone)]
pub struct SimpleRegistry {
    directory: Arc<dyn DirectoryResolver>,
    base_dn: String,
}

impl SimpleRegistry {
    /// Creates a registry searching under `base_dn`.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryResolver>, base_dn: impl Into<String>) -> Self {
        Self { directory, base_dn: base_dn.into() }
    }

    /// Returns a builder that reports a missing directory as an error.
    #[must_use]
    pub fn builder() -> SimpleRegistryBuilder {
        SimpleRegistryBuilder::default()
    }

    /// Replaces the search base.
    ///
    /// Takes `&mut self`: once the registry is shared behind an `Arc` its
    /// base can no longer change.
    pub fn set_base_dn(&mut self, base_dn: impl Into<String>) {
        self.base_dn = base_dn.into();
    }

    /// Returns the directory this registry searches.
    #[must_use]
    pub fn directory(&self) -> &Arc<dyn DirectoryResolver> {
        &self.directory
    }
}

impl fmt::Debug for SimpleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleRegistry").field("base_dn", &self.base_dn).finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenGroupsRegistry for SimpleRegistry {
    fn base_dn(&self) -> &str {
        &self.base_dn
    }

    #[tracing::instrument(skip(self), fields(sid = %sid, base_dn = %self.base_dn))]
    async fn resolve(&self, sid: &Sid) -> RegistryResult<Option<GroupDn>> {
        debug!(filter = %object_sid_filter(sid), "querying directory");
        match self.directory.search(&self.base_dn, sid).await {
            Ok(Some(dn)) => {
                debug!(dn = %dn, "group found");
                Ok(Some(dn))
            },
            Ok(None) => {
                debug!("no group for SID under base DN");
                Ok(None)
            },
            Err(error) => {
                warn!(%error, transient = error.is_transient(), "directory search failed");
                Err(error.into())
            },
        }
    }
}

/// Builder for [`SimpleRegistry`].
#[derive(Default)]
pub struct SimpleRegistryBuilder {
    directory: Option<Arc<dyn DirectoryResolver>>,
    base_dn: String,
}

impl SimpleRegistryBuilder {
    /// Sets the directory to search.
    #[must_use]
    pub fn directory(mut self, directory: impl DirectoryResolver + 'static) -> Self {
        self.directory = Some(Arc::new(directory));
        self
    }

    /// Sets the directory from an already shared handle.
    #[must_use]
    pub fn shared_directory(mut self, directory: Arc<dyn DirectoryResolver>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Sets the search base (default: the directory's context base).
    #[must_use]
    pub fn base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = base_dn.into();
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if no directory was supplied.
    pub fn build(self) -> Result<SimpleRegistry, ConfigError> {
        let directory = self.directory.ok_or(ConfigError::Missing { field: "directory" })?;
        Ok(SimpleRegistry { directory, base_dn: self.base_dn })
    }
}
