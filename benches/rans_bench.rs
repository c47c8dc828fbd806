use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use pixans::predictor::{compute_residuals, reconstruct};
use pixans::symbol::symbolize;
use pixans::{rans, PixelGrid, PredictorParams, StaticModel};

fn test_image(w: usize, h: usize) -> PixelGrid<u8> {
    let mut data = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            data.push((x + y) as u8);
            data.push((x * 2) as u8 ^ (y as u8));
            data.push(((x * y) >> 3) as u8);
        }
    }
    PixelGrid::new(w, h, 3, data).unwrap()
}

fn bench_rans_static(c: &mut Criterion) {
    let mut group = c.benchmark_group("rans_static");
    // Residual-like input: mostly small values around zero
    let symbols: Vec<u16> = (0..100_000u32)
        .map(|i| match i % 17 {
            0 => 40,
            1..=3 => (i % 5) as u16,
            _ => (i % 2) as u16,
        })
        .collect();
    let model = StaticModel::build(&symbols).unwrap();
    group.throughput(Throughput::Elements(symbols.len() as u64));

    group.bench_function("build_model", |b| b.iter(|| StaticModel::build(&symbols).unwrap()));

    group.bench_function("encode", |b| b.iter(|| rans::encode(&symbols, &model).unwrap()));

    let stream = rans::encode(&symbols, &model).unwrap();
    group.bench_function("decode", |b| {
        b.iter(|| rans::decode(&stream, symbols.len(), &model).unwrap())
    });
}

fn bench_predictors(c: &mut Criterion) {
    let mut group = c.benchmark_group("predictors");
    let grid = test_image(128, 128);
    group.throughput(Throughput::Elements(grid.as_slice().len() as u64));

    for (name, params) in [
        ("med", PredictorParams::med()),
        ("least_squares", PredictorParams::least_squares()),
    ] {
        group.bench_function(format!("{name}/residuals"), |b| {
            b.iter(|| compute_residuals(&grid, &params).unwrap())
        });

        let residuals = compute_residuals(&grid, &params).unwrap().residuals;
        group.bench_function(format!("{name}/reconstruct"), |b| {
            b.iter(|| reconstruct::<u8>(&residuals, grid.shape(), &params).unwrap())
        });
    }

    let residuals = compute_residuals(&grid, &PredictorParams::med()).unwrap().residuals;
    group.bench_function("symbolize", |b| b.iter(|| symbolize(&residuals)));
}

criterion_group!(benches, bench_rans_static, bench_predictors);
criterion_main!(benches);
