//! Reading and writing ISO-flavored WKB-encoded (multi)polygons.
//!
//! Land geometry is shipped as a single WKB MultiPolygon per provider. The reader also accepts a
//! bare Polygon, and Z coordinates, which are dropped.

pub(crate) mod common;
mod reader;
mod writer;

pub use common::{Endianness, WKBType};
pub use reader::from_wkb;
pub use writer::{multi_polygon_wkb_size, to_wkb, write_multi_polygon_as_wkb};
