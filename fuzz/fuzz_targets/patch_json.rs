#![no_main]

use libfuzzer_sys::fuzz_target;

// Input is split on the first NUL byte into base and patch documents.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (base, patch) = text.split_once('\0').unwrap_or((text, "{}"));
    if let Ok(merged) = sg_cli::patch::patch_json(base, patch) {
        let reparsed: serde_json::Value =
            serde_json::from_str(&merged).expect("merged output must be valid JSON");
        assert!(reparsed.is_object());
    }
});
