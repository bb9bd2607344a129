use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// The source of the land polygons a mask is built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Global Self-consistent Hierarchical High-resolution Geography.
    #[default]
    Gshhg,

    /// OpenStreetMap land polygons.
    Osm,
}

/// The grid of the bundled masks: 1/240 of a degree, about 460 m at the equator.
pub const PRODUCTION_GRID: Grid = Grid::new(86400, 43200);

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Gshhg, Provider::Osm];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gshhg => "gshhg",
            Provider::Osm => "osm",
        }
    }

    /// The grid this provider's index must be encoded for.
    pub fn grid(&self) -> Grid {
        PRODUCTION_GRID
    }

    /// File name of the compressed index, without any `.xz` suffix.
    pub fn index_file_name(&self) -> String {
        format!("{}_mask.lmsk", self.name())
    }

    /// File name of an index stored as a bare roaring treemap, without any `.xz` suffix.
    pub fn legacy_index_file_name(&self) -> String {
        format!("{}_mask.tbmap", self.name())
    }

    /// File name of the WKB geometry, without any `.xz` suffix.
    pub fn geometry_file_name(&self) -> String {
        format!("{}.wkb", self.name())
    }

    /// The published resource files of this provider.
    pub fn assets(&self) -> impl Iterator<Item = &'static Asset> {
        let provider = *self;
        ASSETS.iter().filter(move |asset| asset.provider == provider)
    }
}

/// Where published assets are downloaded from.
pub const ASSET_BASE_URL: &str = "https://github.com/gauteh/roaring-landmask/raw/main/assets";

/// A published resource file with its pinned SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub provider: Provider,
    pub file_name: &'static str,
    /// Lowercase hex.
    pub sha256: &'static str,
}

pub const ASSETS: [Asset; 4] = [
    Asset {
        provider: Provider::Gshhg,
        file_name: "gshhg_mask.tbmap.xz",
        sha256: "5ea0e772ffc6ca8ad10c5de02be50670cbaedcff20b3541df6b78d3e1fdf48a1",
    },
    Asset {
        provider: Provider::Gshhg,
        file_name: "gshhg.wkb.xz",
        sha256: "05bdf3089407b9829a7a5be7ee43f1e4205f2bbc641e4778af77e4814be216da",
    },
    Asset {
        provider: Provider::Osm,
        file_name: "osm_mask.tbmap.xz",
        sha256: "e60dd30737ad8480619d727bb246a1107d30a66563b73628337dc3f92255b684",
    },
    Asset {
        provider: Provider::Osm,
        file_name: "osm.wkb.xz",
        sha256: "7cbbbb56dc8f6a339d837e57aac4c50c9f54e7ac1118803274725cf61226b727",
    },
];

impl Asset {
    pub fn url(&self) -> String {
        format!("{}/{}", ASSET_BASE_URL, self.file_name)
    }

    /// The pinned asset stored under `file_name`, if any.
    pub fn find(file_name: &str) -> Option<&'static Asset> {
        ASSETS.iter().find(|asset| asset.file_name == file_name)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown provider name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProviderError(String);

impl fmt::Display for ParseProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown provider '{}', expected 'gshhg' or 'osm'", self.0)
    }
}

impl std::error::Error for ParseProviderError {}

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gshhg" => Ok(Provider::Gshhg),
            "osm" => Ok(Provider::Osm),
            _ => Err(ParseProviderError(s.to_string())),
        }
    }
}
