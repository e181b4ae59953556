use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use specsignal::background::{snip1d, snip1d_multiple, snip2d, strip};
use specsignal::peak_shapes::sum_agauss;

fn spectrum(n: usize) -> Vec<f64> {
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let params: Vec<f64> = (1..20)
        .flat_map(|i| [500.0 * i as f64, (n / 20 * i) as f64, 8.0])
        .collect();
    sum_agauss(&x, &params)
        .unwrap()
        .into_iter()
        .zip(x.iter())
        .map(|(y, x)| y + 50.0 + 0.01 * x)
        .collect()
}

fn background_1d(c: &mut Criterion) {
    let _ = pretty_env_logger::try_init();
    let y = spectrum(4096);
    let mut group = c.benchmark_group("background_1d");
    group.bench_function("strip", |b| b.iter(|| strip(&y, 4, 1000, 1.0, &[])));
    for width in [10, 40] {
        group.bench_with_input(BenchmarkId::new("snip1d", width), &width, |b, width| {
            b.iter(|| snip1d(&y, *width))
        });
    }
    let batch: Vec<f64> = (0..32).flat_map(|_| y.iter().copied()).collect();
    group.bench_function("snip1d_multiple", |b| {
        b.iter(|| snip1d_multiple(&batch, 40, 32))
    });
    group.finish();
}

fn background_2d(c: &mut Criterion) {
    let (nrows, ncolumns) = (256, 256);
    let image: Vec<f64> = (0..nrows * ncolumns)
        .map(|i| {
            let (r, q) = ((i / ncolumns) as f64 - 128.0, (i % ncolumns) as f64 - 128.0);
            10.0 + 300.0 * (-(r * r + q * q) / 50.0).exp()
        })
        .collect();
    c.bench_function("snip2d", |b| b.iter(|| snip2d(&image, 10, nrows, ncolumns)));
}

criterion_group!(benches, background_1d, background_2d);
criterion_main!(benches);
