//! Where the mask resources are read from.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the resource directory.
pub const DATA_DIR_ENV: &str = "LANDMASK_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LandmaskConfig {
    /// Directory holding `<provider>_mask.lmsk[.xz]` and `<provider>.wkb[.xz]`.
    pub data_dir: PathBuf,
}

impl LandmaskConfig {
    /// Read `LANDMASK_DATA_DIR`, falling back to the `assets` directory of this crate.
    pub fn from_env() -> Self {
        Self::resolve(std::env::var_os(DATA_DIR_ENV))
    }

    fn resolve(var: Option<OsString>) -> Self {
        let data_dir = match var {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir(),
        };
        Self { data_dir }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for LandmaskConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
}
