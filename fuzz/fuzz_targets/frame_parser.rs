#![no_main]

use libfuzzer_sys::fuzz_target;
use rastro::frame::StackFrame;

fuzz_target!(|data: &[u8]| {
    // Convert arbitrary bytes to UTF-8 string (lossy conversion)
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing degrades malformed lines to raw-text frames;
        // it should not panic regardless of input
        let _ = StackFrame::parse(input);
    }
});
