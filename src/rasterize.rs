//! All-touched rasterization of land polygons onto a [`Grid`].
//!
//! A cell is covered when any part of a polygon, interior or boundary, meets its footprint. Each
//! polygon is burned in two passes:
//!
//! 1. an even-odd scanline fill that sets every cell whose centre lies inside the polygon (holes
//!    included in the crossing count, so lakes stay open);
//! 2. a pass along every ring segment that sets each cell whose closed footprint the segment
//!    meets, which keeps features thinner than a cell. An edge lying on a grid line touches the
//!    cells on both sides.
//!
//! Polygons are unioned into the same raster.

use geo::{BoundingRect, CoordsIter, Line, LineString, MultiPolygon, Polygon};
use tracing::{debug, info};

use crate::error::{LandmaskError, Result};
use crate::grid::Grid;
use crate::index::CompressedIndex;
use crate::raster::DenseRaster;

/// Burns a [`MultiPolygon`] into a [`DenseRaster`].
///
/// ```
/// use geo::{polygon, MultiPolygon};
/// use landmask::{Grid, RasterBuilder};
///
/// let land = MultiPolygon::new(vec![polygon![
///     (x: 0., y: 0.),
///     (x: 10., y: 0.),
///     (x: 10., y: 10.),
///     (x: 0., y: 10.),
/// ]]);
///
/// let land_mask = RasterBuilder::new(Grid::new(360, 180)).build(&land).unwrap();
/// let ocean_mask = RasterBuilder::new(Grid::new(360, 180))
///     .invert(true)
///     .build(&land)
///     .unwrap();
///
/// assert!(land_mask.get(95, 185));
/// assert!(!ocean_mask.get(95, 185));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RasterBuilder {
    grid: Grid,
    invert: bool,
}

impl RasterBuilder {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            invert: false,
        }
    }

    /// Produce the ocean mask (the complement of the land cells) instead of the land mask.
    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn build(&self, geometry: &MultiPolygon) -> Result<DenseRaster> {
        if !geometry
            .coords_iter()
            .all(|c| c.x.is_finite() && c.y.is_finite())
        {
            return Err(LandmaskError::NonFiniteCoordinate);
        }

        info!(
            grid = %self.grid,
            polygons = geometry.0.len(),
            invert = self.invert,
            "rasterizing"
        );

        let mut burner = Burner::new(self.grid);
        for (i, polygon) in geometry.iter().enumerate() {
            burner.fill_interior(polygon);
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                burner.trace_ring(ring);
            }

            if (i + 1) % 10_000 == 0 {
                debug!(done = i + 1, total = geometry.0.len(), "rasterized polygons");
            }
        }

        let mut raster = burner.raster;
        if self.invert {
            raster.invert();
        }

        info!(cells = raster.count_ones(), "rasterized");
        Ok(raster)
    }

    /// Rasterize and compress in one step.
    pub fn build_index(&self, geometry: &MultiPolygon) -> Result<CompressedIndex> {
        Ok(CompressedIndex::from_dense(&self.build(geometry)?))
    }
}

/// Rasterize `geometry` onto `grid`, see [`RasterBuilder`].
pub fn rasterize(geometry: &MultiPolygon, grid: Grid, invert: bool) -> Result<DenseRaster> {
    RasterBuilder::new(grid).invert(invert).build(geometry)
}

/// Rasterize `geometry` onto `grid` and compress the result.
pub fn build_index(geometry: &MultiPolygon, grid: Grid, invert: bool) -> Result<CompressedIndex> {
    RasterBuilder::new(grid).invert(invert).build_index(geometry)
}

/// Works in cell space: `u = (lon + 180) * nx / 360`, `v = (lat + 90) * ny / 180`, so the cell
/// `(row, col)` covers `[col, col + 1) × [row, row + 1)`.
struct Burner {
    raster: DenseRaster,
    nx: u32,
    ny: u32,
    sx: f64,
    sy: f64,
}

impl Burner {
    fn new(grid: Grid) -> Self {
        Self {
            raster: DenseRaster::new(grid),
            nx: grid.nx(),
            ny: grid.ny(),
            sx: grid.nx() as f64 / 360.0,
            sy: grid.ny() as f64 / 180.0,
        }
    }

    #[inline]
    fn to_cell_space(&self, x: f64, y: f64) -> (f64, f64) {
        ((x + 180.0) * self.sx, (y + 90.0) * self.sy)
    }

    fn fill_interior(&mut self, polygon: &Polygon) {
        let Some(bounds) = polygon.bounding_rect() else {
            return;
        };
        let (_, v_min) = self.to_cell_space(bounds.min().x, bounds.min().y);
        let (_, v_max) = self.to_cell_space(bounds.max().x, bounds.max().y);
        let row_start = first_center_at_or_after(v_min, self.ny);
        let row_end = first_center_at_or_after(v_max, self.ny);
        if row_start >= row_end {
            return;
        }

        // x crossings of the row centre lines, per row
        let mut crossings: Vec<Vec<f64>> = vec![Vec::new(); (row_end - row_start) as usize];
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for line in ring.lines() {
                let (u0, v0) = self.to_cell_space(line.start.x, line.start.y);
                let (u1, v1) = self.to_cell_space(line.end.x, line.end.y);
                if v0 == v1 {
                    continue;
                }

                // a centre at v crosses the edge iff lo <= v < hi
                let (lo, hi) = if v0 < v1 { (v0, v1) } else { (v1, v0) };
                let first = first_center_at_or_after(lo, self.ny).max(row_start);
                let last = first_center_at_or_after(hi, self.ny).min(row_end);
                for row in first..last {
                    let v = row as f64 + 0.5;
                    let u = u0 + (v - v0) * (u1 - u0) / (v1 - v0);
                    crossings[(row - row_start) as usize].push(u);
                }
            }
        }

        for (offset, xs) in crossings.iter_mut().enumerate() {
            xs.sort_unstable_by(f64::total_cmp);
            let row = row_start + offset as u32;
            for pair in xs.chunks_exact(2) {
                let col_start = first_center_at_or_after(pair[0], self.nx);
                let col_end = first_center_at_or_after(pair[1], self.nx);
                self.raster.fill_row(row, col_start, col_end);
            }
        }
    }

    fn trace_ring(&mut self, ring: &LineString) {
        for line in ring.lines() {
            self.trace_segment(line);
        }
    }

    /// Set every cell whose closed footprint meets the segment. A segment lying on a grid line
    /// touches the cells on both sides of it. Cells beyond the grid are dropped.
    fn trace_segment(&mut self, line: Line) {
        let (u0, v0) = self.to_cell_space(line.start.x, line.start.y);
        let (u1, v1) = self.to_cell_space(line.end.x, line.end.y);
        let u_at = |v: f64| {
            if v == v0 {
                u0
            } else if v == v1 {
                u1
            } else {
                u0 + (v - v0) * (u1 - u0) / (v1 - v0)
            }
        };

        let (v_lo, v_hi) = (v0.min(v1), v0.max(v1));
        let first_row = (v_lo.ceil() as i64 - 1).max(0);
        let last_row = (v_hi.floor() as i64).min(self.ny as i64 - 1);

        for row in first_row..=last_row {
            // the part of the segment inside the closed band [row, row + 1]
            let (a, b) = if v0 == v1 {
                (u0, u1)
            } else {
                (
                    u_at(v_lo.max(row as f64)),
                    u_at(v_hi.min(row as f64 + 1.0)),
                )
            };
            let (a, b) = (a.min(b), a.max(b));

            let col_start = (a.ceil() as i64 - 1).max(0);
            let col_end = (b.floor() as i64).min(self.nx as i64 - 1);
            if col_start <= col_end {
                self.raster
                    .fill_row(row as u32, col_start as u32, col_end as u32 + 1);
            }
        }
    }
}

/// The first cell whose centre `i + 0.5` is at or after `v`, clamped into `[0, n]`.
#[inline]
fn first_center_at_or_after(v: f64, n: u32) -> u32 {
    ((v - 0.5).ceil() as i64).clamp(0, n as i64) as u32
}
