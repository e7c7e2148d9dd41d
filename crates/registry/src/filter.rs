//! LDAP search filters for SID lookups.
//!
//! `objectSid` is a binary attribute, so a filter matching it spells out
//! every octet of the encoded SID as an RFC 4515 `\xx` escape.

use adtoken_sid::Sid;

/// Escapes every octet as `\xx` with lowercase hex digits.
#[must_use]
pub fn escape_octets(bytes: &[u8]) -> String {
    let digits = hex::encode(bytes);
    let mut out = String::with_capacity(bytes.len() * 3);
    for pair in digits.as_bytes().chunks_exact(2) {
        out.push('\\');
        out.extend(pair.iter().copied().map(char::from));
    }
    out
}

/// Builds the equality filter that selects the entry whose `objectSid` is
/// `sid`.
///
/// ```
/// use adtoken_registry::object_sid_filter;
/// use adtoken_sid::Sid;
///
/// let sid: Sid = "S-1-1-0".parse()?;
/// assert_eq!(
///     object_sid_filter(&sid),
///     r"(objectSid=\01\01\00\00\00\00\00\01\00\00\00\00)"
/// );
/// # Ok::<(), adtoken_sid::SidError>(())
/// ```
#[must_use]
pub fn object_sid_filter(sid: &Sid) -> String {
    format!("(objectSid={})", escape_octets(&sid.encode()))
}
