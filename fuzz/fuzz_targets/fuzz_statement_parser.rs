#![no_main]

use kvquery::Statement;
use kvquery_core::query::{parse_delete_query, parse_query, parse_update_query};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (ignore invalid UTF-8)
    if let Ok(text) = std::str::from_utf8(data) {
        // Limit statement length to prevent timeout
        if text.len() > 10_000 {
            return;
        }

        // None of the parsers may panic, whatever the input
        let _ = parse_query(text);
        let _ = parse_update_query(text);
        let _ = parse_delete_query(text);

        // Re-parsing the normalised form must not panic either
        if let Ok(stmt) = Statement::parse(text) {
            let _ = Statement::parse(&stmt.to_string());
        }
    }
});
