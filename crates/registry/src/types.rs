//! Value types shared by the registries and directory resolvers.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

/// Distinguished name of a group entry, as returned by a directory lookup.
///
/// Always non-empty. The name is carried verbatim; no normalization of case
/// or whitespace is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupDn(String);

impl GroupDn {
    /// Wraps a distinguished name.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Protocol`] if `dn` is empty: a directory
    /// that matches an entry must be able to name it.
    pub fn new(dn: impl Into<String>) -> DirectoryResult<Self> {
        let dn = dn.into();
        if dn.is_empty() {
            return Err(DirectoryError::protocol("directory returned an empty distinguished name"));
        }
        Ok(Self(dn))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the owned name.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GroupDn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GroupDn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GroupDn {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for GroupDn {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for GroupDn {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for GroupDn {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupDn> for String {
    fn from(dn: GroupDn) -> Self {
        dn.0
    }
}

/// Appends the connection's context base to a search-relative entry name.
///
/// Directory searches report entry names relative to the base the
/// connection is bound to. The full name is `entry,base`; an empty base
/// leaves the entry name untouched and an empty entry name resolves to the
/// base itself.
///
/// ```
/// use adtoken_registry::compose_dn;
///
/// assert_eq!(compose_dn("CN=Admins,OU=Groups", "DC=example,DC=com"), "CN=Admins,OU=Groups,DC=example,DC=com");
/// assert_eq!(compose_dn("CN=Admins,DC=example,DC=com", ""), "CN=Admins,DC=example,DC=com");
/// ```
#[must_use]
pub fn compose_dn(entry_dn: &str, context_base: &str) -> String {
    match (entry_dn.is_empty(), context_base.is_empty()) {
        (_, true) => entry_dn.to_owned(),
        (true, false) => context_base.to_owned(),
        (false, false) => format!("{entry_dn},{context_base}"),
    }
}
