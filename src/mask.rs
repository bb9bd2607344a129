//! The land/ocean query engine.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::info;

use crate::config::LandmaskConfig;
use crate::error::{LandmaskError, Result};
use crate::grid::{CoordinateMapper, Grid};
use crate::index::CompressedIndex;
use crate::provider::Provider;
use crate::source::GeometrySource;

/// Smallest slice of a batch handed to a single worker.
#[cfg(feature = "rayon")]
const MIN_PARALLEL_CHUNK: usize = 4096;

type IndexCache = Mutex<BTreeMap<(Provider, PathBuf), Arc<CompressedIndex>>>;

/// Indices loaded so far in this process, by provider and data directory.
fn cache() -> &'static IndexCache {
    static CACHE: OnceLock<IndexCache> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Answers whether points are on land.
///
/// A `Landmask` is an immutable view of a [`CompressedIndex`]; cloning it is cheap and it can be
/// shared freely between threads. Engines built for the same provider and data directory share
/// one copy of the index, which is loaded the first time it is asked for.
///
/// ```
/// use landmask::{CompressedIndex, DenseRaster, Grid, Landmask};
///
/// // a 1° grid with a single land cell east of the prime meridian, north of the equator
/// let grid = Grid::new(360, 180);
/// let mut raster = DenseRaster::new(grid);
/// raster.set(90, 180, true);
///
/// let mask = Landmask::from_index(CompressedIndex::from_dense(&raster));
/// assert!(mask.contains(0.5, 0.5).unwrap());
/// assert!(mask.contains(360.5, 0.5).unwrap());
/// assert!(!mask.contains(-0.5, 0.5).unwrap());
/// assert!(mask.contains(0.0, 91.0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Landmask {
    provider: Option<Provider>,
    index: Arc<CompressedIndex>,
    mapper: CoordinateMapper,
}

impl Landmask {
    /// Load the mask of `provider` from the directory given by [`LandmaskConfig::from_env`].
    pub fn new(provider: Provider) -> Result<Self> {
        Self::with_config(provider, &LandmaskConfig::from_env())
    }

    /// The mask of the default provider.
    pub fn new_default() -> Result<Self> {
        Self::new(Provider::default())
    }

    /// Load the mask of `provider` from `config.data_dir`.
    ///
    /// The index must be encoded for [`Provider::grid`].
    pub fn with_config(provider: Provider, config: &LandmaskConfig) -> Result<Self> {
        let key = (provider, config.data_dir.clone());

        // held while loading so concurrent first uses read the file once
        let mut cache = cache().lock().unwrap_or_else(PoisonError::into_inner);
        let index = match cache.get(&key) {
            Some(index) => Arc::clone(index),
            None => {
                let index = GeometrySource::new(provider, config).index(provider.grid())?;
                info!(
                    provider = %provider,
                    data_dir = %config.data_dir.display(),
                    cells = index.cardinality(),
                    "loaded land mask"
                );
                let index = Arc::new(index);
                cache.insert(key, Arc::clone(&index));
                index
            }
        };
        drop(cache);

        Ok(Self::from_shared(Some(provider), index))
    }

    /// An engine over an index that was built or loaded by other means.
    pub fn from_index(index: CompressedIndex) -> Self {
        Self::from_shared(None, Arc::new(index))
    }

    fn from_shared(provider: Option<Provider>, index: Arc<CompressedIndex>) -> Self {
        let mapper = CoordinateMapper::new(index.grid());
        Self {
            provider,
            index,
            mapper,
        }
    }

    /// The raw WKB MultiPolygon of `provider`'s land polygons.
    pub fn raw_geometry(provider: Provider) -> Result<Vec<u8>> {
        Self::raw_geometry_with_config(provider, &LandmaskConfig::from_env())
    }

    pub fn raw_geometry_with_config(provider: Provider, config: &LandmaskConfig) -> Result<Vec<u8>> {
        GeometrySource::new(provider, config).wkb()
    }

    /// The provider the index was loaded for, `None` for [`Landmask::from_index`].
    pub fn provider(&self) -> Option<Provider> {
        self.provider
    }

    pub fn index(&self) -> &CompressedIndex {
        &self.index
    }

    pub fn grid(&self) -> Grid {
        self.mapper.grid()
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Cell width in degrees.
    pub fn dx(&self) -> f64 {
        self.grid().dx()
    }

    /// Cell height in degrees.
    pub fn dy(&self) -> f64 {
        self.grid().dy()
    }

    /// Whether `(lon, lat)` is on land.
    ///
    /// Longitude wraps around, latitude must be within [-90, 90].
    #[inline]
    pub fn contains(&self, lon: f64, lat: f64) -> Result<bool> {
        let (row, col) = self.mapper.normalize(lon, lat)?;
        Ok(self.index.contains(row, col))
    }

    /// [`Landmask::contains`] for every pair of `lons` and `lats`.
    pub fn contains_many(&self, lons: &[f64], lats: &[f64]) -> Result<Vec<bool>> {
        let mut out = vec![false; lons.len()];
        self.contains_many_into(lons, lats, &mut out)?;
        Ok(out)
    }

    /// Same as [`Landmask::contains_many`], writing into `out`.
    ///
    /// `out` must be as long as the input. Its contents are unspecified if an error is returned.
    pub fn contains_many_into(&self, lons: &[f64], lats: &[f64], out: &mut [bool]) -> Result<()> {
        check_shape(lons, lats, out)?;
        self.fill(lons, lats, out)
    }

    /// Same as [`Landmask::contains_many`], split over the rayon thread pool.
    ///
    /// The result is identical to the sequential one. Without the `rayon` feature this is the
    /// sequential version.
    pub fn contains_many_parallel(&self, lons: &[f64], lats: &[f64]) -> Result<Vec<bool>> {
        let mut out = vec![false; lons.len()];
        self.contains_many_parallel_into(lons, lats, &mut out)?;
        Ok(out)
    }

    /// Same as [`Landmask::contains_many_parallel`], writing into `out`.
    ///
    /// On failure the error names the first invalid point, as the sequential version does.
    pub fn contains_many_parallel_into(
        &self,
        lons: &[f64],
        lats: &[f64],
        out: &mut [bool],
    ) -> Result<()> {
        check_shape(lons, lats, out)?;

        #[cfg(feature = "rayon")]
        {
            let chunk_len = lons
                .len()
                .div_ceil(rayon::current_num_threads())
                .max(MIN_PARALLEL_CHUNK);

            let result = out
                .par_chunks_mut(chunk_len)
                .zip(lons.par_chunks(chunk_len))
                .zip(lats.par_chunks(chunk_len))
                .try_for_each(|((out, lons), lats)| self.fill(lons, lats, out));

            // whichever chunk failed first may not hold the first invalid point
            result.or_else(|_| self.fill(lons, lats, out))
        }

        #[cfg(not(feature = "rayon"))]
        {
            self.fill(lons, lats, out)
        }
    }

    #[inline]
    fn fill(&self, lons: &[f64], lats: &[f64], out: &mut [bool]) -> Result<()> {
        for ((&lon, &lat), out) in lons.iter().zip(lats).zip(out.iter_mut()) {
            *out = self.contains(lon, lat)?;
        }
        Ok(())
    }
}

fn check_shape(lons: &[f64], lats: &[f64], out: &[bool]) -> Result<()> {
    if lons.len() != lats.len() {
        return Err(LandmaskError::InputShape {
            lons: lons.len(),
            lats: lats.len(),
        });
    }
    if out.len() != lons.len() {
        return Err(LandmaskError::InputShape {
            lons: lons.len(),
            lats: out.len(),
        });
    }
    Ok(())
}
