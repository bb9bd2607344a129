use criterion::{criterion_group, criterion_main, Criterion};
use geo::{MultiPolygon, Polygon};
use landmask::io::wkb::{from_wkb, to_wkb};
use landmask::{CompressedIndex, Grid, RasterBuilder};

/// A ring of `n` small jagged islands around the globe.
fn archipelago(n: usize) -> MultiPolygon {
    let polygons = (0..n)
        .map(|i| {
            let cx = -179.0 + 358.0 * i as f64 / n as f64;
            let cy = 60.0 * ((i as f64) * 0.37).sin();
            let ring: Vec<(f64, f64)> = (0..64)
                .map(|k| {
                    let a = k as f64 / 64.0 * std::f64::consts::TAU;
                    let r = 0.4 + 0.15 * ((k * 7 % 5) as f64 / 5.0);
                    (cx + r * a.cos(), cy + r * a.sin())
                })
                .collect();
            Polygon::new(ring.into(), vec![])
        })
        .collect();
    MultiPolygon::new(polygons)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let geometry = archipelago(2_000);
    let grid = Grid::new(8640, 4320);
    let builder = RasterBuilder::new(grid);

    c.bench_function("rasterize 2000 islands", |b| {
        b.iter(|| builder.build(&geometry).unwrap())
    });

    let raster = builder.build(&geometry).unwrap();
    c.bench_function("compress dense raster", |b| {
        b.iter(|| CompressedIndex::from_dense(&raster))
    });

    let index = CompressedIndex::from_dense(&raster);
    let bytes = index.to_bytes();
    c.bench_function("deserialize index", |b| {
        b.iter(|| CompressedIndex::from_bytes(&bytes).unwrap())
    });

    let wkb = to_wkb(&geometry);
    c.bench_function("parse WKB to geo::MultiPolygon", |b| {
        b.iter(|| from_wkb(&wkb).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
