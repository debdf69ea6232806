// ========================================================================================
//
//                       Transform path performance benchmark
//
// ========================================================================================
//
// Measures the managed, parallel and native transform paths on the synthetic reference
// batch. Every iteration starts from a fresh copy of the reference scores, so each path
// always sees the same mix of excluded, boosted and untouched items.

use advscore::config::{BatchLayout, DEFAULT_BATCH_SIZE};
use advscore::io::ItemColumns;
use advscore::transform::TransformPath;
use advscore::types::{BoostParams, ScoreBatch};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// Batch sizes to measure. The last one matches the reference benchmark batch.
const BATCH_SIZES: [usize; 3] = [1024, 8 * 1024, DEFAULT_BATCH_SIZE];

fn bench_transform_paths(c: &mut Criterion) {
    let params = BoostParams::default();
    let mut group = c.benchmark_group("transform_paths");

    for size in BATCH_SIZES {
        let reference = ItemColumns::reference(size);
        group.throughput(Throughput::Elements(size as u64));

        for path in TransformPath::ALL {
            let layout = BatchLayout {
                size,
                path,
                ..BatchLayout::default()
            };
            let mut transformer = layout.transformer();

            group.bench_with_input(
                BenchmarkId::new(transformer.name(), size),
                &reference,
                |b, reference| {
                    b.iter_batched_ref(
                        || reference.scores.clone(),
                        |scores| {
                            transformer.transform(
                                ScoreBatch::new(
                                    scores,
                                    &reference.adv_weights,
                                    &reference.prosale_only_flags,
                                ),
                                black_box(&params),
                            )
                        },
                        BatchSize::LargeInput,
                    )
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_transform_paths);
criterion_main!(benches);
