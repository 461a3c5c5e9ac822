#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tokens) = sgqs_query::tokenize(input) {
        assert!(!tokens.is_empty());
    }
    let _ = sgqs_query::prepare(input);
});
