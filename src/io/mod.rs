//! Reader and writer implementations for the geometry interchange formats used by landmask
//! resources.

pub mod wkb;
