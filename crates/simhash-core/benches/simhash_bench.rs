use criterion::{black_box, criterion_group, criterion_main, Criterion};
use simhash_core::{BandPartitioner, Fingerprint, FingerprintEngine, IndexConfig, MemoryBandStore, NearDuplicateIndex};

const TEXT: &str = "How are you? I Am fine. ablar ablar xyz blar blar blar blar blar blar blar Thanks.";

fn bench_from_text(c: &mut Criterion) {
    let engine = FingerprintEngine::default();
    c.bench_function("simhash_from_text", |b| {
        b.iter(|| black_box(engine.build_from_text(black_box(TEXT))))
    });
}

fn bench_distance(c: &mut Criterion) {
    let a = Fingerprint::from_text("benchmark document one");
    let b2 = Fingerprint::from_text("benchmark document two");
    c.bench_function("simhash_distance", |b| b.iter(|| black_box(a.distance(&b2))));
}

fn bench_band_keys(c: &mut Criterion) {
    let bands = BandPartitioner::new(64, 10).unwrap();
    let fp = Fingerprint::from_text(TEXT);
    c.bench_function("simhash_band_keys_k10", |b| b.iter(|| black_box(bands.band_keys(&fp))));
}

fn bench_query(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let objs: Vec<Fingerprint> = (0..10_000)
        .map(|i| Fingerprint::from_text(&format!("document number {i} about the weather")))
        .collect();
    let index = rt
        .block_on(NearDuplicateIndex::initialize(
            MemoryBandStore::new(),
            &objs,
            IndexConfig::default().with_tolerance(3),
        ))
        .unwrap();
    let query = Fingerprint::from_text("document number 42 about the weather");

    c.bench_function("simhash_query_10k", |b| {
        b.iter(|| black_box(rt.block_on(index.get_near_duplicates(&query))))
    });
}

criterion_group!(benches, bench_from_text, bench_distance, bench_band_keys, bench_query);
criterion_main!(benches);
