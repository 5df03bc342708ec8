#![no_main]
use libfuzzer_sys::fuzz_target;
use mftparse::{extract_actions, DEFAULT_LABEL};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(records) = extract_actions(s) {
            for record in records {
                let label = record.detail("label").unwrap_or(DEFAULT_LABEL);
                assert_eq!(record.label, label);
            }
        }
    }
});
