//! In-memory directory for tests and development.
//!
//! [`MemoryDirectory`] stores entries the way a directory search reports
//! them: each name is relative to the connection's context base, and the
//! context base is appended on the way out. Base DN matching follows LDAP
//! subtree scope with case-insensitive comparison.
//!
//! # Example
//!
//! ```
//! use adtoken_registry::{DirectoryResolver, MemoryDirectory};
//! use adtoken_sid::Sid;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let directory = MemoryDirectory::with_context_base("DC=example,DC=com");
//! let sid: Sid = "S-1-5-32-545".parse().unwrap();
//! directory.insert("CN=Users,CN=Builtin", sid.clone());
//!
//! let dn = directory.search("CN=Builtin", &sid).await.unwrap();
//! assert_eq!(dn.unwrap(), "CN=Users,CN=Builtin,DC=example,DC=com");
//! assert!(directory.search("OU=Elsewhere", &sid).await.unwrap().is_none());
//! # });
//! ```

use std::sync::Arc;

use adtoken_sid::Sid;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use crate::{
    config::RegistryConfig,
    directory::DirectoryResolver,
    error::DirectoryResult,
    types::{GroupDn, compose_dn},
};

#[derive(Debug, Clone)]
struct DirectoryEntry {
    relative_dn: String,
    object_sid: Sid,
}

/// Thread-safe in-memory [`DirectoryResolver`].
///
/// Clones share the same entries.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    entries: Arc<RwLock<Vec<DirectoryEntry>>>,
    context_base: Arc<str>,
}

impl MemoryDirectory {
    /// Creates an empty directory with no context base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty directory whose connection is bound to
    /// `context_base`.
    #[must_use]
    pub fn with_context_base(context_base: impl Into<String>) -> Self {
        Self { entries: Arc::default(), context_base: context_base.into().into() }
    }

    /// Creates an empty directory bound to the configuration's
    /// `context_base_dn`.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::with_context_base(config.context_base_dn())
    }

    /// Returns the context base appended to every returned name.
    #[must_use]
    pub fn context_base(&self) -> &str {
        &self.context_base
    }

    /// Adds an entry. `relative_dn` is relative to the context base.
    ///
    /// Entries are searched in insertion order, so when several share an
    /// `objectSid` the earliest inserted one wins.
    pub fn insert(&self, relative_dn: impl Into<String>, object_sid: Sid) {
        self.entries.write().push(DirectoryEntry { relative_dn: relative_dn.into(), object_sid });
    }

    /// Removes every entry carrying `object_sid`, returning how many were
    /// removed.
    pub fn remove(&self, object_sid: &Sid) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| &entry.object_sid != object_sid);
        before - entries.len()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the directory holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Subtree scope: `dn` is `base` itself or lies beneath it.
fn in_subtree(dn: &str, base: &str) -> bool {
    if base.is_empty() {
        return true;
    }
    let dn = dn.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    dn == base || dn.strip_suffix(&base).is_some_and(|head| head.ends_with(','))
}

#[async_trait]
impl DirectoryResolver for MemoryDirectory {
    #[tracing::instrument(skip(self), fields(sid = %sid))]
    async fn search(&self, base_dn: &str, sid: &Sid) -> DirectoryResult<Option<GroupDn>> {
        let relative = self
            .entries
            .read()
            .iter()
            .find(|entry| &entry.object_sid == sid && in_subtree(&entry.relative_dn, base_dn))
            .map(|entry| entry.relative_dn.clone());

        match relative {
            Some(relative_dn) => {
                trace!(relative_dn = %relative_dn, "entry matched");
                GroupDn::new(compose_dn(&relative_dn, &self.context_base)).map(Some)
            },
            None => Ok(None),
        }
    }
}
