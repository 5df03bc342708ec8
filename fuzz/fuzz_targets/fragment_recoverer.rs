#![no_main]
use libfuzzer_sys::fuzz_target;
use mftparse::{extract_fragments, is_well_formed};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let fragments = extract_fragments(s, "project");
        for fragment in &fragments {
            assert!(is_well_formed(fragment));
        }
        assert_eq!(extract_fragments(&fragments.concat(), "project"), fragments);
    }
});
