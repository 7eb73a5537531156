use bbx::nms::{non_max_suppression, NmsConfig, Reduction};
use bbx::{iou, AspectPolicy, Boxes};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Clusters of `copies` overlapping boxes spread over a grid
fn create_detections(clusters: usize, copies: usize) -> Boxes {
    let mut coords = Vec::with_capacity(clusters * copies);
    let mut scores = Vec::with_capacity(clusters * copies);
    for i in 0..clusters {
        let x = (i % 50) as f64 * 60.0;
        let y = (i / 50) as f64 * 60.0;
        for c in 0..copies {
            let jitter = c as f64 * 2.0;
            coords.push([x + jitter, y + jitter, x + 50.0 + jitter, y + 50.0 + jitter]);
            scores.push(0.9 - (c as f64) * 0.05 - (i as f64) * 1e-5);
        }
    }
    Boxes::new(coords).with_field("scores", scores).unwrap()
}

fn bench_iou_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("iou_matrix");

    for size in [10, 50, 100, 500].iter() {
        let boxes = create_detections(*size, 1);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| iou(black_box(&boxes), black_box(&boxes)));
        });
    }
    group.finish();
}

fn bench_nms(c: &mut Criterion) {
    let mut group = c.benchmark_group("nms");

    for clusters in [10, 50, 100, 500].iter() {
        let boxes = create_detections(*clusters, 5);
        for reduction in [Reduction::Max, Reduction::Mean] {
            let config = NmsConfig::new().with_reduction(reduction);
            group.bench_with_input(
                BenchmarkId::new(reduction.as_str(), clusters),
                clusters,
                |b, _| {
                    b.iter(|| non_max_suppression(black_box(&boxes), black_box(&config)));
                },
            );
        }
    }
    group.finish();
}

fn bench_transforms(c: &mut Criterion) {
    let boxes = create_detections(1000, 1);

    c.bench_function("resize_1000", |b| {
        b.iter(|| black_box(&boxes).resize(black_box(1.5)));
    });

    c.bench_function("set_aspect_ratio_1000", |b| {
        b.iter(|| black_box(&boxes).set_aspect_ratio(black_box(0.75), AspectPolicy::Expand));
    });
}

criterion_group!(benches, bench_iou_matrix, bench_nms, bench_transforms);
criterion_main!(benches);
