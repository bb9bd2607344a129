#![allow(dead_code)]

use geo::{polygon, MultiPolygon};
use landmask::{build_index, CoordinateMapper, CompressedIndex, Grid, Landmask, PRODUCTION_GRID};

/// A tenth of a degree.
pub const TEST_GRID: Grid = Grid::new(3600, 1800);

/// A coarse toy world: a Scandinavian block, land on both sides of the antimeridian at the
/// latitude of the Bering Strait, a lake in Africa and an Antarctic cap down to the pole.
pub fn world() -> MultiPolygon {
    MultiPolygon::new(vec![
        polygon![
            (x: 5., y: 58.),
            (x: 30., y: 58.),
            (x: 30., y: 71.),
            (x: 5., y: 71.),
        ],
        polygon![
            (x: 170., y: 60.),
            (x: 180., y: 60.),
            (x: 180., y: 70.),
            (x: 170., y: 70.),
        ],
        polygon![
            (x: -180., y: 60.),
            (x: -170., y: 60.),
            (x: -170., y: 70.),
            (x: -180., y: 70.),
        ],
        polygon!(
            exterior: [
                (x: 10., y: -20.),
                (x: 40., y: -20.),
                (x: 40., y: 10.),
                (x: 10., y: 10.),
            ],
            interiors: [
                [
                    (x: 20., y: -10.),
                    (x: 30., y: -10.),
                    (x: 30., y: 0.),
                    (x: 20., y: 0.),
                ],
            ],
        ),
        polygon![
            (x: -180., y: -90.),
            (x: 180., y: -90.),
            (x: 180., y: -75.),
            (x: -180., y: -75.),
        ],
    ])
}

pub fn world_mask() -> Landmask {
    Landmask::from_index(build_index(&world(), TEST_GRID, false).unwrap())
}

/// Land over [14, 16) × [65, 66) on the production grid, without rasterizing the whole globe.
pub fn production_block() -> CompressedIndex {
    let mapper = CoordinateMapper::new(PRODUCTION_GRID);
    let (row0, col0) = mapper.normalize(14.0, 65.0).unwrap();
    let (row1, col1) = mapper.normalize(16.0, 66.0).unwrap();
    let cells = (row0..row1)
        .flat_map(|row| (col0..col1).map(move |col| PRODUCTION_GRID.linear_index(row, col)));
    CompressedIndex::from_sorted_iter(PRODUCTION_GRID, cells).unwrap()
}

/// Deterministic pseudo random points, longitudes well beyond [-180, 180).
pub fn scattered_points(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    let mut next = move || {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut lons = Vec::with_capacity(n);
    let mut lats = Vec::with_capacity(n);
    for _ in 0..n {
        lons.push(next() * 1080.0 - 540.0);
        lats.push(next() * 180.0 - 90.0);
    }
    (lons, lats)
}
