//! A compressed bitmap over the cells of a [`Grid`].
//!
//! Land cells are stored by their linear index (`row * nx + col`) in a
//! [`RoaringTreemap`]. The production grid has fewer than 2^32 cells, so the treemap holds a
//! single 32-bit roaring bitmap whose array and bitmap containers adapt to sparse islands and
//! solid continents alike.

mod serialize;

use roaring::RoaringTreemap;
use serde::Serialize;
use tracing::debug;

pub use serialize::{FORMAT_VERSION, MAGIC};

use crate::error::{LandmaskError, Result};
use crate::grid::Grid;
use crate::raster::DenseRaster;

/// The set of land cells of a [`Grid`], stored as a compressed bitmap.
///
/// The index is exact: [`CompressedIndex::contains`] agrees with the raster it was built from for
/// every cell. It is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedIndex {
    grid: Grid,
    bitmap: RoaringTreemap,
}

/// Summary of an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub grid: Grid,
    pub cardinality: u64,
    /// Fraction of the grid that is set.
    pub density: f64,
    pub first_cell: Option<u64>,
    pub last_cell: Option<u64>,
    pub serialized_size: usize,
}

impl CompressedIndex {
    /// An index without any set cells.
    pub fn empty(grid: Grid) -> Self {
        Self {
            grid,
            bitmap: RoaringTreemap::new(),
        }
    }

    /// Compress a dense raster.
    pub fn from_dense(raster: &DenseRaster) -> Self {
        let grid = raster.grid();
        let bitmap: RoaringTreemap = raster.iter_ones().collect();

        debug!(
            grid = %grid,
            cardinality = bitmap.len(),
            bytes = bitmap.serialized_size(),
            "compressed dense raster"
        );
        Self { grid, bitmap }
    }

    /// Build an index from strictly ascending linear cell indices.
    pub fn from_sorted_iter(grid: Grid, indices: impl IntoIterator<Item = u64>) -> Result<Self> {
        let mut bitmap = RoaringTreemap::new();
        let mut last: Option<u64> = None;

        for index in indices {
            check_in_grid(grid, index)?;
            if last.is_some_and(|last| index <= last) {
                return Err(LandmaskError::ResourceCorrupt(
                    "cell indices must be strictly ascending".to_string(),
                ));
            }
            last = Some(index);
            bitmap.insert(index);
        }

        Ok(Self { grid, bitmap })
    }

    /// Wrap an existing treemap of linear cell indices.
    pub fn from_treemap(grid: Grid, bitmap: RoaringTreemap) -> Result<Self> {
        if let Some(max) = bitmap.max() {
            check_in_grid(grid, max)?;
        }
        Ok(Self { grid, bitmap })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// The underlying bitmap of linear cell indices.
    pub fn treemap(&self) -> &RoaringTreemap {
        &self.bitmap
    }

    /// Number of set (land) cells.
    pub fn cardinality(&self) -> u64 {
        self.bitmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Whether the cell at `(row, col)` is set. Cells outside the grid are never set.
    #[inline]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        if row >= self.grid.ny() || col >= self.grid.nx() {
            return false;
        }
        self.bitmap.contains(self.grid.linear_index(row, col))
    }

    /// Whether the cell with the given linear index is set.
    #[inline]
    pub fn contains_index(&self, index: u64) -> bool {
        self.bitmap.contains(index)
    }

    /// Linear indices of all set cells, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.bitmap.iter()
    }

    /// Expand back into a dense raster. This is lossless.
    pub fn to_dense(&self) -> DenseRaster {
        let mut raster = DenseRaster::new(self.grid);
        let words = raster.words_mut();
        for index in self.bitmap.iter() {
            words[(index / 64) as usize] |= 1u64 << (index % 64);
        }
        raster
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            grid: self.grid,
            cardinality: self.cardinality(),
            density: self.cardinality() as f64 / self.grid.num_cells() as f64,
            first_cell: self.bitmap.min(),
            last_cell: self.bitmap.max(),
            serialized_size: self.serialized_size(),
        }
    }
}

fn check_in_grid(grid: Grid, index: u64) -> Result<()> {
    if index >= grid.num_cells() {
        return Err(LandmaskError::ResourceCorrupt(format!(
            "cell index {} is outside grid {}",
            index, grid
        )));
    }
    Ok(())
}
