//! The registry abstraction shared by the plain and caching resolvers.
//!
//! [`TokenGroupsRegistry`] turns `tokenGroups` values into group
//! distinguished names. Implementors provide [`resolve`] for an already
//! decoded [`Sid`]; the byte and string entry points are provided methods
//! that decode first and treat malformed input as "no group".
//!
//! [`resolve`]: TokenGroupsRegistry::resolve

use std::sync::Arc;

use adtoken_sid::Sid;
use async_trait::async_trait;
use tracing::warn;

use crate::{error::RegistryResult, types::GroupDn};

/// Maps security identifiers to group distinguished names.
///
/// # Outcomes
///
/// Every lookup ends in one of three ways:
///
/// - `Ok(Some(dn))` - the SID names a group under the base DN
/// - `Ok(None)` - no such group, or the input was not a SID
/// - `Err(_)` - the directory could not be queried
#[async_trait]
pub trait TokenGroupsRegistry: Send + Sync {
    /// Returns the search base, relative to the directory's context base.
    fn base_dn(&self) -> &str;

    /// Resolves a decoded SID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Directory`](crate::RegistryError::Directory)
    /// when the directory lookup fails.
    async fn resolve(&self, sid: &Sid) -> RegistryResult<Option<GroupDn>>;

    /// Resolves one binary `tokenGroups` value.
    ///
    /// Bytes that do not decode as a SID are logged and reported as
    /// `Ok(None)` without a directory lookup.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    async fn get_dn_from_sid(&self, token: &[u8]) -> RegistryResult<Option<GroupDn>> {
        match sid_from_token(token) {
            Some(sid) => self.resolve(&sid).await,
            None => Ok(None),
        }
    }

    /// Resolves a SID given as text.
    ///
    /// Canonical `S-R-A-...` text is parsed directly. Anything else is taken
    /// to be a binary value carried in a string and decoded from its UTF-8
    /// bytes. Input that fits neither reading is reported as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    async fn get_dn_from_sid_str(&self, token: &str) -> RegistryResult<Option<GroupDn>> {
        match sid_from_str(token) {
            Some(sid) => self.resolve(&sid).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<R: TokenGroupsRegistry + ?Sized> TokenGroupsRegistry for Arc<R> {
    fn base_dn(&self) -> &str {
        (**self).base_dn()
    }

    async fn resolve(&self, sid: &Sid) -> RegistryResult<Option<GroupDn>> {
        (**self).resolve(sid).await
    }

    async fn get_dn_from_sid(&self, token: &[u8]) -> RegistryResult<Option<GroupDn>> {
        (**self).get_dn_from_sid(token).await
    }

    async fn get_dn_from_sid_str(&self, token: &str) -> RegistryResult<Option<GroupDn>> {
        (**self).get_dn_from_sid_str(token).await
    }
}

/// Decodes a binary `tokenGroups` value, logging and discarding failures.
#[must_use]
pub fn sid_from_token(token: &[u8]) -> Option<Sid> {
    match Sid::decode(token) {
        Ok(sid) => Some(sid),
        Err(error) => {
            warn!(token = %hex::encode(token), %error, "invalid SID in tokenGroups value");
            None
        },
    }
}

/// Reads a SID from text, first as canonical form then as raw bytes.
#[must_use]
pub fn sid_from_str(token: &str) -> Option<Sid> {
    if token.starts_with("S-")
        && let Ok(sid) = token.parse()
    {
        return Some(sid);
    }
    sid_from_token(token.as_bytes())
}
