//! Decoder fuzz target: feed arbitrary bytes to the wire decoder.
//! Decoding must not panic. Whatever decodes must re-encode to something that decodes to
//! an equal list.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let list = match ofpacts::decode(data, data.len()) {
        Ok(l) => l,
        Err(_) => return,
    };
    let _ = ofpacts::format(&list);
    let wire = ofpacts::to_openflow(&list);
    let again = ofpacts::decode(&wire, wire.len()).expect("re-encoded list must decode");
    assert_eq!(list, again);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
