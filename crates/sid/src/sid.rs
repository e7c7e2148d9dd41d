//! The [`Sid`] value type and its binary and string codecs.
//!
//! # Binary layout
//!
//! ```text
//! offset  size  field
//! 0       1     revision
//! 1       1     sub-authority count (n)
//! 2       6     identifier authority, 48-bit big-endian
//! 8       4*n   sub-authorities, 32-bit little-endian each
//! ```
//!
//! For example `S-1-5-21-2127521184-1604012920-1887927527-72713` is
//!
//! ```text
//! 01 05 000000000005 15000000 A065CF7E 784B9B5F E77C8770 091C0100
//! ```
//!
//! # String layout
//!
//! `S-{revision}-{authority}(-{sub_authority})*`, every number in decimal.
//! The canonical string is the identity of a SID: two binary SIDs denote the
//! same principal iff their canonical strings are equal.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{SidError, SidResult};

/// Length of the fixed header (revision, count, authority).
pub const SID_HEADER_LEN: usize = 8;

/// Largest identifier authority representable in the 6-byte field.
pub const MAX_AUTHORITY: u64 = (1 << 48) - 1;

/// Largest sub-authority count representable in the one-byte field.
pub const MAX_SUB_AUTHORITIES: usize = u8::MAX as usize;

const SUB_AUTHORITY_LEN: usize = 4;

/// A security identifier.
///
/// Immutable once constructed. Ordering and hashing follow the
/// `(revision, authority, sub_authorities)` tuple, which is consistent with
/// equality of the canonical string form.
///
/// # Examples
///
/// ```
/// use adtoken_sid::Sid;
///
/// let bytes = [
///     0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05,
///     0x20, 0x00, 0x00, 0x00, 0x21, 0x02, 0x00, 0x00,
/// ];
/// let sid = Sid::decode(&bytes)?;
/// assert_eq!(sid.to_string(), "S-1-5-32-545");
/// assert_eq!(sid.encode(), bytes);
///
/// let parsed: Sid = "S-1-5-32-545".parse()?;
/// assert_eq!(parsed, sid);
/// # Ok::<(), adtoken_sid::SidError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sid {
    revision: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl Sid {
    /// Builds a SID from its components.
    ///
    /// # Errors
    ///
    /// - [`SidError::AuthorityOutOfRange`] if `authority` exceeds 48 bits
    /// - [`SidError::TooManySubAuthorities`] if more than 255 sub-authorities are given
    pub fn new(revision: u8, authority: u64, sub_authorities: Vec<u32>) -> SidResult<Self> {
        if authority > MAX_AUTHORITY {
            return Err(SidError::AuthorityOutOfRange { value: authority });
        }
        if sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities { count: sub_authorities.len() });
        }
        Ok(Self { revision, authority, sub_authorities })
    }

    /// Decodes a binary SID.
    ///
    /// Only the `8 + 4 * count` bytes announced by the header are read; any
    /// trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SidError::TooShort`] if the buffer is shorter than the header
    /// or than the length announced by its sub-authority count.
    pub fn decode(bytes: &[u8]) -> SidResult<Self> {
        if bytes.len() < SID_HEADER_LEN {
            return Err(SidError::TooShort { len: bytes.len(), required: SID_HEADER_LEN });
        }

        let revision = bytes[0];
        let count = usize::from(bytes[1]);
        let required = Self::len_for(count);
        if bytes.len() < required {
            return Err(SidError::TooShort { len: bytes.len(), required });
        }

        let mut authority = [0u8; 8];
        authority[2..].copy_from_slice(&bytes[2..SID_HEADER_LEN]);
        let authority = u64::from_be_bytes(authority);

        let sub_authorities = bytes[SID_HEADER_LEN..required]
            .chunks_exact(SUB_AUTHORITY_LEN)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self { revision, authority, sub_authorities })
    }

    /// Encodes this SID into its minimal binary form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.revision);
        // `new`, `decode` and `from_str` all bound the count to a byte.
        out.push(self.sub_authorities.len() as u8);
        out.extend_from_slice(&self.authority.to_be_bytes()[2..]);
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }

    /// Length in bytes of the binary form.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        Self::len_for(self.sub_authorities.len())
    }

    /// SID revision (always 1 for SIDs issued by Windows).
    #[must_use]
    pub fn revision(&self) -> u8 {
        self.revision
    }

    /// 48-bit identifier authority (5 for `SECURITY_NT_AUTHORITY`).
    #[must_use]
    pub fn authority(&self) -> u64 {
        self.authority
    }

    /// Sub-authorities in wire order.
    #[must_use]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Number of sub-authorities.
    #[must_use]
    pub fn sub_authority_count(&self) -> u8 {
        self.sub_authorities.len() as u8
    }

    /// Relative identifier: the last sub-authority, if any.
    #[must_use]
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }

    fn len_for(count: usize) -> usize {
        SID_HEADER_LEN + SUB_AUTHORITY_LEN * count
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-{}", self.revision, self.authority)?;
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl FromStr for Sid {
    type Err = SidError;

    /// Parses the canonical `S-R-A-S1-...-Sn` form.
    ///
    /// Fields must be plain decimal digits: signs, whitespace and hexadecimal
    /// authorities are rejected.
    fn from_str(s: &str) -> SidResult<Self> {
        let rest = s.strip_prefix("S-").ok_or(SidError::MissingPrefix)?;
        let fields: Vec<&str> = rest.split('-').collect();
        // The prefix counts as the first field.
        let found = fields.len() + 1;
        if found < 3 {
            return Err(SidError::TooFewFields { found });
        }

        let revision = parse_field::<u8>(1, fields[0])?;
        let authority = parse_field::<u64>(2, fields[1])?;
        if authority > MAX_AUTHORITY {
            return Err(SidError::AuthorityOutOfRange { value: authority });
        }

        let subs = &fields[2..];
        if subs.len() > MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities { count: subs.len() });
        }
        let sub_authorities = subs
            .iter()
            .enumerate()
            .map(|(i, field)| parse_field::<u32>(i + 3, field))
            .collect::<SidResult<Vec<_>>>()?;

        Ok(Self { revision, authority, sub_authorities })
    }
}

fn parse_field<T: FromStr>(position: usize, field: &str) -> SidResult<T> {
    let invalid = || SidError::InvalidField { position, value: field.to_owned() };
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    field.parse().map_err(|_| invalid())
}

impl TryFrom<&[u8]> for Sid {
    type Error = SidError;

    fn try_from(bytes: &[u8]) -> SidResult<Self> {
        Self::decode(bytes)
    }
}

impl TryFrom<String> for Sid {
    type Error = SidError;

    fn try_from(s: String) -> SidResult<Self> {
        s.parse()
    }
}

impl From<Sid> for String {
    fn from(sid: Sid) -> Self {
        sid.to_string()
    }
}
