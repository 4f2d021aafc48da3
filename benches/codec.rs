//! Criterion benchmarks for the postings and varint codecs.

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use xiphos::postings::{Posting, PostingList};
use xiphos::util::varint;

/// Generate a posting list with realistic small deltas.
fn generate_postings(count: usize) -> PostingList {
    let mut postings = Vec::with_capacity(count);
    let mut doc_id = 0u64;

    for i in 0..count {
        doc_id += 1 + ((i * 7) % 120) as u64; // Pseudo-random gap distribution
        let frequency = 1 + (i % 5) as u32;
        postings.push(Posting::new(doc_id, frequency));
    }

    PostingList::new(postings).expect("generated postings are ascending")
}

fn bench_varint(c: &mut Criterion) {
    let values: Vec<u64> = (0..1000u64).map(|i| i * i * 31).collect();

    let mut group = c.benchmark_group("varint");
    group.throughput(Throughput::Elements(values.len() as u64));

    group.bench_function("encode_u64", |b| {
        b.iter(|| {
            for &value in &values {
                black_box(varint::encode_u64(black_box(value)));
            }
        })
    });

    let encoded: Vec<Vec<u8>> = values.iter().map(|&v| varint::encode_u64(v)).collect();
    group.bench_function("decode_u64", |b| {
        b.iter(|| {
            for bytes in &encoded {
                black_box(varint::decode_u64(black_box(bytes)).unwrap());
            }
        })
    });

    group.finish();
}

fn bench_postings_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("postings");

    for count in [16usize, 256, 4096] {
        let list = generate_postings(count);
        let encoded = list.encode();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("encode/{count}"), |b| {
            b.iter(|| black_box(black_box(&list).encode()))
        });
        group.bench_function(format!("decode/{count}"), |b| {
            b.iter(|| black_box(PostingList::decode(black_box(&encoded)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_varint, bench_postings_codec);
criterion_main!(benches);
