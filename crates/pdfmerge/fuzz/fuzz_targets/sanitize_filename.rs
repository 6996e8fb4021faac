#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfmerge::utils::output_filename;

fuzz_target!(|data: &[u8]| {
    let requested = String::from_utf8_lossy(data);
    let name = output_filename(Some(&requested), "merged_document");

    assert!(name.ends_with(".pdf"));
    assert!(name.len() > ".pdf".len());
    assert!(
        name.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    );
});
