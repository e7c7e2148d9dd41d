//! Security identifier codec for Active Directory token groups.
//!
//! The `tokenGroups` attribute of a directory entry carries each group
//! membership as a binary SID. This crate converts between that binary
//! form and the canonical `S-R-A-S1-...-Sn` string, which is what the rest
//! of the workspace uses as the identity of a group.
//!
//! # Quick Start
//!
//! ```
//! use adtoken_sid::Sid;
//!
//! let token = [
//!     0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05,
//!     0x20, 0x00, 0x00, 0x00, 0x21, 0x02, 0x00, 0x00,
//! ];
//! let sid = Sid::decode(&token)?;
//! assert_eq!(sid.to_string(), "S-1-5-32-545");
//! assert_eq!(sid.rid(), Some(545));
//! # Ok::<(), adtoken_sid::SidError>(())
//! ```
//!
//! # Error Handling
//!
//! Decoding and parsing return [`SidResult<T>`]. Every malformed input maps
//! to a [`SidError`] variant; nothing in this crate panics on untrusted
//! bytes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod sid;

pub use error::{SidError, SidResult};
pub use sid::{MAX_AUTHORITY, MAX_SUB_AUTHORITIES, SID_HEADER_LEN, Sid};
