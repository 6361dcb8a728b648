#![no_main]

use am_parser::parse_document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let parsed = parse_document(&text);
    for table in &parsed.tables {
        for row in &table.rows {
            assert!(row.len() <= table.headers.len());
        }
    }
});
