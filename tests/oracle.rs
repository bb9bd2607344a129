//! Cross-checks against data produced independently of the compressed index.

mod common;

use common::{scattered_points, world, TEST_GRID};
use geo::{Contains, Intersects, Point};
use landmask::{modulate_longitude, CompressedIndex, DenseRaster, Grid, Landmask, RasterBuilder};

fn legacy_cell(row: u32, col: u32) -> bool {
    (row * 7 + col * 13) % 11 < 4 || (row > 300 && col < 200) || (row == 17 && col > 600)
}

/// The old one-byte-per-cell raster format, filled directly from a predicate.
fn legacy_flat_raster(grid: Grid) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(grid.num_cells() as usize);
    for row in 0..grid.ny() {
        for col in 0..grid.nx() {
            bytes.push(legacy_cell(row, col) as u8);
        }
    }
    bytes
}

#[test]
fn matches_legacy_flat_raster() {
    let grid = Grid::new(720, 360);
    let bytes = legacy_flat_raster(grid);
    let raster = DenseRaster::from_bytes(grid, &bytes).unwrap();
    assert_eq!(raster.to_bytes(), bytes);

    let stored = CompressedIndex::from_dense(&raster).to_bytes();
    let mask = Landmask::from_index(CompressedIndex::from_bytes(&stored).unwrap());

    for row in 0..grid.ny() {
        for col in 0..grid.nx() {
            let cell = grid.cell_bounds(row, col);
            let expected = legacy_cell(row, col);
            // centre and points close to two opposite corners
            for (fx, fy) in [(0.5, 0.5), (0.05, 0.05), (0.95, 0.95)] {
                let lon = cell.min().x + fx * grid.dx();
                let lat = cell.min().y + fy * grid.dy();
                assert_eq!(
                    mask.contains(lon, lat).unwrap(),
                    expected,
                    "cell ({}, {}) at ({}, {})",
                    row,
                    col,
                    lon,
                    lat
                );
            }
        }
    }
}

#[test]
fn stored_index_matches_rasterized_geometry() {
    let raster = RasterBuilder::new(TEST_GRID).build(&world()).unwrap();
    let index = CompressedIndex::from_bytes(&CompressedIndex::from_dense(&raster).to_bytes()).unwrap();

    assert_eq!(index.cardinality(), raster.count_ones());
    for row in 0..TEST_GRID.ny() {
        for col in 0..TEST_GRID.nx() {
            assert_eq!(index.contains(row, col), raster.get(row, col));
        }
    }
}

#[test]
fn agrees_with_polygons() {
    let world = world();
    let mask = Landmask::from_index(
        RasterBuilder::new(TEST_GRID)
            .build_index(&world)
            .unwrap(),
    );
    let (lons, lats) = scattered_points(50_000);

    for (&lon, &lat) in lons.iter().zip(&lats) {
        let on_land = mask.contains(lon, lat).unwrap();
        let point = Point::new(modulate_longitude(lon), lat);

        // every point inside a polygon is land
        if world.0.iter().any(|p| p.contains(&point)) {
            assert!(on_land, "({}, {})", lon, lat);
        }

        // every land point lies in a cell touching some polygon
        if on_land {
            let (row, col) = mask.mapper().normalize(lon, lat).unwrap();
            let cell = TEST_GRID.cell_bounds(row, col);
            assert!(
                world.0.iter().any(|p| p.intersects(&cell)),
                "({}, {})",
                lon,
                lat
            );
        }
    }
}

#[test]
fn ocean_mask_is_the_complement() {
    let land = Landmask::from_index(
        RasterBuilder::new(TEST_GRID)
            .build_index(&world())
            .unwrap(),
    );
    let ocean = Landmask::from_index(
        RasterBuilder::new(TEST_GRID)
            .invert(true)
            .build_index(&world())
            .unwrap(),
    );

    assert_eq!(
        land.index().cardinality() + ocean.index().cardinality(),
        TEST_GRID.num_cells()
    );

    let (lons, lats) = scattered_points(20_000);
    let land = land.contains_many(&lons, &lats).unwrap();
    let ocean = ocean.contains_many(&lons, &lats).unwrap();
    assert!(land.iter().zip(&ocean).all(|(a, b)| a != b));
}
