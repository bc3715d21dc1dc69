#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = transpatch::PeImage::parse(data) {
        let _ = transpatch::extract_referenced_strings(&image, &transpatch::AnalysisConfig::default());
    }
});
