#![no_main]
use libfuzzer_sys::fuzz_target;
use mftparse::{parse_first_table, render};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let table = parse_first_table(s);
        for row in &table.rows {
            assert_eq!(row.len(), table.header.len());
        }
        let _ = render::to_csv(&table);
    }
});
