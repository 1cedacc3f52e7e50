#![no_main]

use kvquery_core::query::compile_like_pattern;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, &str)| {
    let (pattern, subject) = input;
    if pattern.len() > 1_000 {
        return;
    }

    // Every LIKE pattern is escaped, so compilation must always succeed
    let compiled = compile_like_pattern(pattern).expect("escaped LIKE pattern must compile");

    // A pattern without wildcards matches only itself
    if !pattern.contains(['%', '_']) {
        assert_eq!(compiled.is_match(subject), pattern == subject);
        assert!(compiled.is_match(pattern));
    }
});
