//! Fuzz target for binary SID decoding.
//!
//! Feeds arbitrary byte strings to the decoder, the path every
//! `tokenGroups` value takes. Every result must be either `Ok(Sid)` or
//! `Err(SidError)`; a successful decode must survive both round trips.

#![no_main]

use adtoken_sid::Sid;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(sid) = Sid::decode(data) else {
        return;
    };

    // Re-encoding reproduces exactly the bytes the header announced.
    let encoded = sid.encode();
    assert_eq!(&data[..encoded.len()], &encoded[..]);

    // The canonical string parses back to the same value.
    let text = sid.to_string();
    let parsed: Sid = text.parse().expect("canonical string must parse");
    assert_eq!(parsed, sid);
});
