//! Criterion benchmarks for minerace-core hot paths.
//!
//! Covers: checksum digests, the difficulty predicate, and a fixed-difficulty
//! nonce search (the only unbounded loop in the system).

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use minerace_core::block_validation::validate_candidate;
use minerace_core::{
    meets_difficulty, Block, BlockHeader, Chain, Checksum, ChecksumProvider, Crc32Checksum,
    Difficulty, ProducerId, Sha256Checksum,
};

fn sample_header() -> BlockHeader {
    BlockHeader {
        height: 1,
        timestamp: 1_700_000_000,
        prev_checksum: Checksum(0xAABB_CCDD),
        difficulty: 12,
        nonce: 42,
        producer: ProducerId(3),
    }
}

fn bench_digests(c: &mut Criterion) {
    let header = sample_header();

    c.bench_function("crc32_checksum", |b| {
        b.iter(|| Crc32Checksum.checksum(black_box(&header)))
    });

    c.bench_function("sha256_checksum", |b| {
        b.iter(|| Sha256Checksum.checksum(black_box(&header)))
    });
}

fn bench_meets_difficulty(c: &mut Criterion) {
    c.bench_function("meets_difficulty", |b| {
        b.iter(|| meets_difficulty(black_box(Checksum(0x000F_FFFF)), black_box(12)))
    });
}

fn bench_search(c: &mut Criterion) {
    let difficulty = Difficulty::new(12).unwrap();

    c.bench_function("search_difficulty_12", |b| {
        b.iter(|| {
            let mut block = Block::new(sample_header(), &Crc32Checksum);
            while !difficulty.is_met_by(block.checksum) {
                block.header.nonce += 1;
                block.reseal(&Crc32Checksum);
            }
            block.header.nonce
        })
    });
}

fn bench_validate(c: &mut Criterion) {
    let chain = Chain::new(Difficulty::TRIVIAL, 1_700_000_000, &Crc32Checksum);
    let tip = chain.tip();
    let candidate = Block::new(
        BlockHeader {
            height: tip.next_height(),
            prev_checksum: tip.checksum,
            difficulty: 0,
            ..sample_header()
        },
        &Crc32Checksum,
    );

    c.bench_function("validate_candidate", |b| {
        b.iter(|| validate_candidate(black_box(&candidate), &chain, &Crc32Checksum))
    });
}

criterion_group!(
    benches,
    bench_digests,
    bench_meets_difficulty,
    bench_search,
    bench_validate,
);
criterion_main!(benches);
