//! Defines [`LandmaskError`], representing all errors returned by this crate.

use std::path::PathBuf;
use thiserror::Error;

use crate::grid::Grid;
use crate::provider::Provider;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LandmaskError {
    /// A bundled resource file could not be found for a provider.
    #[error("Missing {provider} resource: {}", path.display())]
    ResourceMissing { provider: Provider, path: PathBuf },

    /// A resource was found but could not be decoded.
    #[error("Corrupt resource: {0}")]
    ResourceCorrupt(String),

    /// A resource encodes a different grid than the one it is loaded for.
    #[error("Grid mismatch: expected {expected}, found {found}")]
    GridMismatch { expected: Grid, found: Grid },

    /// Coordinate sequences (or an output buffer) of differing lengths were passed to a batch
    /// query.
    #[error("Input shape mismatch: {lons} longitudes, {lats} latitudes")]
    InputShape { lons: usize, lats: usize },

    /// Latitude outside [-90, 90], or a non-finite coordinate.
    #[error("Coordinate out of range: lon = {lon}, lat = {lat}")]
    CoordinateRange { lon: f64, lat: f64 },

    /// Geometry passed to the rasterizer contains a NaN or infinite coordinate.
    #[error("Geometry contains a non-finite coordinate")]
    NonFiniteCoordinate,

    /// The WKB buffer is not a valid Polygon or MultiPolygon.
    #[error("Invalid WKB: {0}")]
    InvalidWkb(String),

    /// [std::io::Error]
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

impl LandmaskError {
    /// Whether this error stems from loading a bundled resource.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            LandmaskError::ResourceMissing { .. }
                | LandmaskError::ResourceCorrupt(_)
                | LandmaskError::GridMismatch { .. }
        )
    }
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, LandmaskError>;
