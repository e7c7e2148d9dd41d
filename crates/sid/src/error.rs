//! Error type for security identifier decoding and parsing.
//!
//! Every way an input can fail to be a SID has its own variant so callers
//! (and logs) can tell a truncated `tokenGroups` value apart from a typo in
//! a configured string SID.
//!
//! # Example
//!
//! ```
//! use adtoken_sid::{Sid, SidError};
//!
//! let err = Sid::decode(&[0x01, 0x02, 0x00]).unwrap_err();
//! assert_eq!(err, SidError::TooShort { len: 3, required: 8 });
//! ```

use thiserror::Error;

/// Result type alias for SID codec operations.
pub type SidResult<T> = Result<T, SidError>;

/// Reasons an input cannot be interpreted as a security identifier.
///
/// # Non-exhaustive
///
/// New variants may be added in minor releases. Match expressions must
/// include a wildcard arm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SidError {
    /// The binary buffer is shorter than the header or than the length
    /// announced by its sub-authority count.
    #[error("SID buffer too short: {len} bytes, {required} required")]
    TooShort {
        /// Length of the supplied buffer.
        len: usize,
        /// Minimum length needed to decode it.
        required: usize,
    },

    /// The string form does not start with `S-`.
    #[error("SID string must start with \"S-\"")]
    MissingPrefix,

    /// The string form has fewer than three dash-separated fields.
    #[error("SID string has {found} fields, at least 3 required")]
    TooFewFields {
        /// Number of dash-separated fields found, prefix included.
        found: usize,
    },

    /// A field of the string form is empty, non-numeric or out of range for
    /// its type.
    #[error("invalid SID field at position {position}: {value:?}")]
    InvalidField {
        /// Zero-based field index, the `S` prefix being field 0.
        position: usize,
        /// The offending text.
        value: String,
    },

    /// More sub-authorities than the one-byte count can describe.
    #[error("SID has {count} sub-authorities, at most 255 allowed")]
    TooManySubAuthorities {
        /// Number of sub-authorities supplied.
        count: usize,
    },

    /// The identifier authority does not fit in 48 bits.
    #[error("SID authority {value} exceeds 48 bits")]
    AuthorityOutOfRange {
        /// The rejected authority value.
        value: u64,
    },
}
