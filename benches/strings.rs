use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use transpatch::strings::{extract_strings_from_raw_bytes, StringExtractConfig};
use transpatch::Rva;

/// A data section of aligned strings interleaved with binary noise.
fn synthetic_section(size: usize) -> Vec<u8> {
    let words: [&[u8]; 6] = [b"Strike the earth!", b"Quit", b"Embark", b"dwarf", b"Urist McMiner", b"Settings"];
    let mut data = Vec::with_capacity(size);
    let mut i = 0usize;
    while data.len() < size {
        let word = words[i % words.len()];
        data.extend_from_slice(word);
        data.push(0);
        while data.len() % 4 != 0 {
            data.push(0);
        }
        // a dword of pointer-like noise after every other string
        if i % 2 == 0 {
            data.extend_from_slice(&(0x1_4000_0000u64 + i as u64 * 8).to_le_bytes()[..4]);
        }
        i += 1;
    }
    data.truncate(size);
    data
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings-extract");
    let cfg = StringExtractConfig::default();
    for size in [64 * 1024, 1024 * 1024] {
        let data = synthetic_section(size);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("cp437-{size}"), |b| {
            b.iter_batched(
                || data.clone(),
                |buf| {
                    let n = extract_strings_from_raw_bytes(&buf, Rva(0x2000), &cfg)
                        .map(|it| it.count())
                        .unwrap_or(0);
                    std::hint::black_box(n);
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
