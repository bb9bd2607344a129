//! Fast land/ocean lookups for geographic points.
//!
//! Land polygons from a [`Provider`] are rasterized once onto a fine global [`Grid`] and stored
//! as a [`CompressedIndex`]. A [`Landmask`] answers point queries against that index without
//! ever expanding the full raster in memory:
//!
//! ```no_run
//! use landmask::{Landmask, Provider};
//!
//! let mask = Landmask::new(Provider::Gshhg)?;
//! assert!(mask.contains(15.0, 65.6)?);
//!
//! let on_land = mask.contains_many_parallel(&[15.0, -30.0], &[65.6, 0.0])?;
//! assert_eq!(on_land, vec![true, false]);
//! # Ok::<(), landmask::error::LandmaskError>(())
//! ```
//!
//! The offline side, turning a WKB MultiPolygon into an index, lives in [`rasterize`] and
//! [`source`]. Resource files are checked against SHA-256 digests before they are decoded; the
//! published assets and their pinned digests are listed in [`ASSETS`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod config;
pub mod error;
pub mod grid;
pub mod index;
pub mod io;
pub mod mask;
pub mod provider;
pub mod raster;
pub mod rasterize;
pub mod source;
#[cfg(test)]
pub(crate) mod test;

pub use config::LandmaskConfig;
pub use error::{LandmaskError, Result};
pub use grid::{modulate_longitude, CoordinateMapper, Grid};
pub use index::{CompressedIndex, IndexStats};
pub use mask::Landmask;
pub use provider::{Asset, Provider, ASSETS, ASSET_BASE_URL, PRODUCTION_GRID};
pub use raster::DenseRaster;
pub use rasterize::{build_index, RasterBuilder};
pub use source::GeometrySource;
