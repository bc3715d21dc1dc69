#![no_main]
use libfuzzer_sys::fuzz_target;
use transpatch::analysis::{find_intersected_cross_references, find_relative_cross_references};
use transpatch::Rva;

fuzz_target!(|data: &[u8]| {
    let targets = Rva(0)..Rva(0x10000);
    let table = find_relative_cross_references(data, Rva(0x1000), &targets);
    for sources in table.values() {
        assert!(sources.windows(2).all(|w| w[0] < w[1]));
    }
    let _ = find_intersected_cross_references(&table);
});
