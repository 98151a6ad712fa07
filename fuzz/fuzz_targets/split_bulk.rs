#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(entries) = sg_cli::payload::split_bulk(text) {
            for entry in entries {
                assert!(entry.body.get("CLIConfiguration").is_none());
            }
        }
    }
});
