//! The directory lookup seam.
//!
//! A [`DirectoryResolver`] answers one question: which entry under a search
//! base has a given `objectSid`? The registry owns caching and malformed
//! input handling; resolvers only talk to the directory.
//!
//! # Implementing a Resolver
//!
//! An LDAP-backed resolver would run a subtree search rooted at `base_dn`
//! (relative to the connection's context base) with
//! [`object_sid_filter`](crate::object_sid_filter), take the first match,
//! and return its name made absolute with [`compose_dn`](crate::compose_dn).
//! Transport failures map to [`DirectoryError`](crate::DirectoryError)
//! variants.
//!
//! See [`MemoryDirectory`](crate::MemoryDirectory) for a reference
//! implementation.

use std::sync::Arc;

use adtoken_sid::Sid;
use async_trait::async_trait;

use crate::{error::DirectoryResult, types::GroupDn};

/// Looks up directory entries by security identifier.
#[async_trait]
pub trait DirectoryResolver: Send + Sync {
    /// Searches the subtree rooted at `base_dn` for the entry whose
    /// `objectSid` equals `sid`.
    ///
    /// `base_dn` is relative to the context base of the directory
    /// connection; an empty string searches from the context base itself.
    ///
    /// # Returns
    ///
    /// The absolute distinguished name of the first matching entry, or
    /// `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`](crate::DirectoryError) when the
    /// directory cannot be queried.
    async fn search(&self, base_dn: &str, sid: &Sid) -> DirectoryResult<Option<GroupDn>>;
}

#[async_trait]
impl<D: DirectoryResolver + ?Sized> DirectoryResolver for Arc<D> {
    async fn search(&self, base_dn: &str, sid: &Sid) -> DirectoryResult<Option<GroupDn>> {
        (**self).search(base_dn, sid).await
    }
}
