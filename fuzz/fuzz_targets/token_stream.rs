#![no_main]

use libfuzzer_sys::fuzz_target;
use token::{encode_value, TokenReader};

fuzz_target!(|data: &[u8]| {
    // Flat iteration must terminate and stop at the first error.
    let mut count = 0usize;
    for token in token::decode_stream(data) {
        count += 1;
        if token.is_err() {
            break;
        }
    }
    assert!(count <= data.len() + 1);

    // Anything the structured reader accepts must encode again.
    let mut reader = TokenReader::new(data).with_max_depth(8);
    while let Ok(value) = reader.read_value() {
        let _ = encode_value(&value);
        if reader.is_empty() {
            break;
        }
    }
});
