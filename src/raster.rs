//! A dense, bit-packed land/ocean raster.

use crate::error::{LandmaskError, Result};
use crate::grid::Grid;

/// One bit per cell of a [`Grid`], stored row-major in 64-bit words.
///
/// This is the uncompressed form produced by rasterization and consumed by
/// [`CompressedIndex::from_dense`](crate::index::CompressedIndex::from_dense). Bits past
/// `grid.num_cells()` in the last word are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseRaster {
    grid: Grid,
    words: Vec<u64>,
}

impl DenseRaster {
    /// An all-zero raster.
    pub fn new(grid: Grid) -> Self {
        let words = vec![0; grid.num_cells().div_ceil(64) as usize];
        Self { grid, words }
    }

    /// Read a flat raster with one byte per cell (`0` or `1`), row-major, row 0 at latitude -90.
    ///
    /// This is the layout of the legacy `mask.bin` dumps.
    pub fn from_bytes(grid: Grid, bytes: &[u8]) -> Result<Self> {
        if bytes.len() as u64 != grid.num_cells() {
            return Err(LandmaskError::ResourceCorrupt(format!(
                "dense raster has {} cells, grid {} needs {}",
                bytes.len(),
                grid,
                grid.num_cells()
            )));
        }

        let mut raster = Self::new(grid);
        for (word, chunk) in raster.words.iter_mut().zip(bytes.chunks(64)) {
            for (bit, value) in chunk.iter().enumerate() {
                match value {
                    0 => {}
                    1 => *word |= 1u64 << bit,
                    v => {
                        return Err(LandmaskError::ResourceCorrupt(format!(
                            "dense raster value {} is neither 0 nor 1",
                            v
                        )))
                    }
                }
            }
        }

        Ok(raster)
    }

    /// The inverse of [`DenseRaster::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..self.grid.num_cells())
            .map(|i| self.get_index(i) as u8)
            .collect()
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    #[inline]
    pub fn get(&self, row: u32, col: u32) -> bool {
        self.get_index(self.grid.linear_index(row, col))
    }

    #[inline]
    pub fn get_index(&self, index: u64) -> bool {
        debug_assert!(index < self.grid.num_cells());
        self.words[(index / 64) as usize] & (1u64 << (index % 64)) != 0
    }

    #[inline]
    pub fn set(&mut self, row: u32, col: u32, value: bool) {
        debug_assert!(row < self.grid.ny() && col < self.grid.nx());
        let index = self.grid.linear_index(row, col);
        let word = &mut self.words[(index / 64) as usize];
        if value {
            *word |= 1u64 << (index % 64);
        } else {
            *word &= !(1u64 << (index % 64));
        }
    }

    /// Set the cells `[col_start, col_end)` of a row.
    pub fn fill_row(&mut self, row: u32, col_start: u32, col_end: u32) {
        let col_end = col_end.min(self.grid.nx());
        if col_start < col_end {
            self.fill_range(
                self.grid.linear_index(row, col_start),
                self.grid.linear_index(row, col_end),
            );
        }
    }

    /// Set the linear cells `[start, end)`, a word at a time.
    fn fill_range(&mut self, start: u64, end: u64) {
        let mut i = start;
        while i < end {
            let bit = i % 64;
            let n = (end - i).min(64 - bit);
            let mask = if n == 64 {
                u64::MAX
            } else {
                ((1u64 << n) - 1) << bit
            };
            self.words[(i / 64) as usize] |= mask;
            i += n;
        }
    }

    /// Number of set cells.
    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }

    /// Flip every cell, turning a land mask into an ocean mask and vice versa.
    pub fn invert(&mut self) {
        self.words.iter_mut().for_each(|w| *w = !*w);
        self.clear_tail();
    }

    /// Linear indices of all set cells, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = u64> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let base = i as u64 * 64;
            BitIter(word).map(move |bit| base + bit as u64)
        })
    }

    /// The packed words, 64 cells each, least significant bit first.
    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    pub(crate) fn clear_tail(&mut self) {
        let used = (self.grid.num_cells() % 64) as u32;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

/// Positions of the set bits of a word, ascending.
pub(crate) struct BitIter(pub(crate) u64);

impl Iterator for BitIter {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            None
        } else {
            let bit = self.0.trailing_zeros();
            self.0 &= self.0 - 1;
            Some(bit)
        }
    }
}
