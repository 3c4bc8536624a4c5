#![no_main]

use libfuzzer_sys::fuzz_target;

use eventlens::extractor::clean_to_markdown;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // Sanitizing and converting must never panic, whatever the markup
    let _ = clean_to_markdown(&html);
});
