//! The global raster grid and the mapping from geographic coordinates to grid cells.

use std::fmt;

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{LandmaskError, Result};

/// A fixed global raster of `nx × ny` cells covering longitude [-180, 180) and latitude
/// [-90, 90].
///
/// Rows run south to north (row 0 touches latitude -90), columns west to east (column 0 starts
/// at longitude -180). Cells are addressed linearly as `row * nx + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridDimensions")]
pub struct Grid {
    nx: u32,
    ny: u32,
}

/// Unchecked wire form of a [`Grid`].
#[derive(Deserialize)]
struct GridDimensions {
    nx: u32,
    ny: u32,
}

impl TryFrom<GridDimensions> for Grid {
    type Error = String;

    fn try_from(value: GridDimensions) -> std::result::Result<Self, Self::Error> {
        Grid::try_new(value.nx, value.ny).ok_or_else(|| {
            format!(
                "grid dimensions must be non-zero, got {}x{}",
                value.nx, value.ny
            )
        })
    }
}

impl Grid {
    /// Create a new grid.
    ///
    /// # Panics
    ///
    /// If either dimension is zero.
    pub const fn new(nx: u32, ny: u32) -> Self {
        assert!(nx > 0 && ny > 0, "grid dimensions must be non-zero");
        Self { nx, ny }
    }

    /// Create a new grid, returning `None` if either dimension is zero.
    pub const fn try_new(nx: u32, ny: u32) -> Option<Self> {
        if nx == 0 || ny == 0 {
            None
        } else {
            Some(Self { nx, ny })
        }
    }

    /// Number of columns (longitude).
    pub const fn nx(&self) -> u32 {
        self.nx
    }

    /// Number of rows (latitude).
    pub const fn ny(&self) -> u32 {
        self.ny
    }

    /// Total number of cells.
    pub const fn num_cells(&self) -> u64 {
        self.nx as u64 * self.ny as u64
    }

    /// Cell width in degrees longitude.
    pub fn dx(&self) -> f64 {
        360.0 / self.nx as f64
    }

    /// Cell height in degrees latitude.
    pub fn dy(&self) -> f64 {
        180.0 / self.ny as f64
    }

    /// The linear index of a cell.
    #[inline]
    pub const fn linear_index(&self, row: u32, col: u32) -> u64 {
        row as u64 * self.nx as u64 + col as u64
    }

    /// The inverse of [`Grid::linear_index`].
    #[inline]
    pub const fn cell_of(&self, index: u64) -> (u32, u32) {
        (
            (index / self.nx as u64) as u32,
            (index % self.nx as u64) as u32,
        )
    }

    /// The footprint of a cell in geographic coordinates.
    pub fn cell_bounds(&self, row: u32, col: u32) -> Rect {
        let x0 = -180.0 + col as f64 * self.dx();
        let y0 = -90.0 + row as f64 * self.dy();
        Rect::new(
            coord! { x: x0, y: y0 },
            coord! { x: x0 + self.dx(), y: y0 + self.dy() },
        )
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.nx, self.ny)
    }
}

/// Wrap a longitude into [-180, 180).
///
/// `lon`, `lon ± 360`, `lon ± 720`, ... all give the same result, and both 180 and -180 map to
/// -180.
#[inline]
pub fn modulate_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Maps geographic coordinates to cells of a [`Grid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    grid: Grid,
    // cells per degree
    sx: f64,
    sy: f64,
}

impl CoordinateMapper {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            sx: grid.nx as f64 / 360.0,
            sy: grid.ny as f64 / 180.0,
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Map `(lon, lat)` to `(row, col)`.
    ///
    /// Longitude is unbounded and wrapped with [`modulate_longitude`]. Latitude must lie within
    /// [-90, 90]; the poles map to the outermost rows. Anything else, including non-finite
    /// input, is a [`LandmaskError::CoordinateRange`].
    #[inline]
    pub fn normalize(&self, lon: f64, lat: f64) -> Result<(u32, u32)> {
        if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(LandmaskError::CoordinateRange { lon, lat });
        }

        Ok(self.normalize_unchecked(lon, lat))
    }

    /// Same as [`CoordinateMapper::normalize`], but without validating the input.
    ///
    /// Invalid input still lands in some cell of the grid, since both axes are clamped.
    #[inline]
    pub(crate) fn normalize_unchecked(&self, lon: f64, lat: f64) -> (u32, u32) {
        let lon = modulate_longitude(lon);
        let col = clamp_cell((lon + 180.0) * self.sx, self.grid.nx);
        let row = clamp_cell((lat + 90.0) * self.sy, self.grid.ny);
        (row, col)
    }
}

/// Floor `v` and clamp it into `[0, n - 1]`. NaN ends up in cell 0.
#[inline]
fn clamp_cell(v: f64, n: u32) -> u32 {
    // `as` saturates on overflow and maps NaN to 0
    (v.floor() as i64).clamp(0, n as i64 - 1) as u32
}
