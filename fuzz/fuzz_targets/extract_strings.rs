#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cfg = transpatch::StringExtractConfig::default();
    if let Ok(strings) = transpatch::extract_strings_from_raw_bytes(data, transpatch::Rva(0x2000), &cfg) {
        for s in strings {
            assert!(s.address.value() >= 0x2000);
            assert!(((s.address.value() - 0x2000) as usize) < data.len());
        }
    }
});
