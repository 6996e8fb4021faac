#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfmerge::merge::Merger;
use pdfmerge::validation::Validator;

fuzz_target!(|data: &[u8]| {
    let validator = Validator::with_max_pages(64);

    // Arbitrary bytes must be rejected with an error, never a panic
    let Ok(parsed) = validator.validate(data) else {
        return;
    };
    assert!(parsed.page_count >= 1);

    // Anything that validates must also merge with itself
    let merged = Merger::new()
        .merge(&[parsed.clone(), parsed.clone()])
        .expect("validated documents merge");
    assert_eq!(merged.statistics.total_pages, parsed.page_count * 2);
});
