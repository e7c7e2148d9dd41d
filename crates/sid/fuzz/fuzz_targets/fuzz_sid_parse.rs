//! Structured fuzz target for string SID parsing.
//!
//! Uses `arbitrary` to build dash-separated inputs that look like SIDs, which
//! reaches the per-field validation far more often than raw bytes would.

#![no_main]

use adtoken_sid::Sid;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

/// A SID-shaped string: optional prefix plus fuzzed fields.
#[derive(Debug, Arbitrary)]
struct FuzzedSid {
    /// Whether to emit the `S-` prefix.
    prefixed: bool,
    /// Raw field texts, joined with dashes.
    fields: Vec<String>,
}

fuzz_target!(|input: FuzzedSid| {
    let body = input.fields.join("-");
    let text = if input.prefixed { format!("S-{body}") } else { body };

    if let Ok(sid) = text.parse::<Sid>() {
        // Leading zeros are accepted, so compare through the canonical form.
        let canonical = sid.to_string();
        assert_eq!(canonical.parse::<Sid>().expect("canonical string must parse"), sid);
        assert_eq!(Sid::decode(&sid.encode()).expect("encoding decodes"), sid);
    }
});
