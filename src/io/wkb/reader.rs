use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::error::{LandmaskError, Result};
use crate::io::wkb::common::{Endianness, WKBType};

/// Parse a WKB Polygon or MultiPolygon into a [`MultiPolygon`].
///
/// Each nested geometry carries its own byte order, and either order is accepted. Any other
/// geometry type, a truncated buffer or trailing bytes are an [`LandmaskError::InvalidWkb`].
pub fn from_wkb(buf: &[u8]) -> Result<MultiPolygon> {
    let mut reader = WKBReader {
        cursor: Cursor::new(buf),
    };

    let (byte_order, wkb_type) = reader.read_header()?;
    let geom = match wkb_type {
        WKBType::Polygon => MultiPolygon::new(vec![reader.read_polygon_body(byte_order, false)?]),
        WKBType::PolygonZ => MultiPolygon::new(vec![reader.read_polygon_body(byte_order, true)?]),
        WKBType::MultiPolygon | WKBType::MultiPolygonZ => {
            reader.read_multi_polygon_body(byte_order)?
        }
        other => {
            return Err(LandmaskError::InvalidWkb(format!(
                "expected a Polygon or MultiPolygon, found {:?}",
                other
            )))
        }
    };

    if reader.remaining() != 0 {
        return Err(LandmaskError::InvalidWkb(format!(
            "{} trailing bytes after geometry",
            reader.remaining()
        )));
    }

    Ok(geom)
}

struct WKBReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

fn truncated(_: std::io::Error) -> LandmaskError {
    LandmaskError::InvalidWkb("unexpected end of buffer".to_string())
}

impl<'a> WKBReader<'a> {
    fn remaining(&self) -> usize {
        self.cursor.get_ref().len() - self.cursor.position() as usize
    }

    /// - 1: byteOrder
    /// - 4: wkbType
    fn read_header(&mut self) -> Result<(Endianness, WKBType)> {
        let byte_order = self.cursor.read_u8().map_err(truncated)?;
        let byte_order = Endianness::try_from(byte_order).map_err(|b| {
            LandmaskError::InvalidWkb(format!("unexpected byte order {}", b))
        })?;

        let wkb_type = self.read_u32(byte_order)?;
        let wkb_type = WKBType::try_from(wkb_type)
            .map_err(|_| LandmaskError::InvalidWkb(format!("unknown geometry type {}", wkb_type)))?;

        Ok((byte_order, wkb_type))
    }

    fn read_u32(&mut self, byte_order: Endianness) -> Result<u32> {
        match byte_order {
            Endianness::BigEndian => self.cursor.read_u32::<BigEndian>(),
            Endianness::LittleEndian => self.cursor.read_u32::<LittleEndian>(),
        }
        .map_err(truncated)
    }

    fn read_f64(&mut self, byte_order: Endianness) -> Result<f64> {
        match byte_order {
            Endianness::BigEndian => self.cursor.read_f64::<BigEndian>(),
            Endianness::LittleEndian => self.cursor.read_f64::<LittleEndian>(),
        }
        .map_err(truncated)
    }

    /// Read an element count, making sure the buffer can actually hold that many elements of at
    /// least `min_size` bytes each.
    fn read_count(&mut self, byte_order: Endianness, min_size: usize) -> Result<usize> {
        let count = self.read_u32(byte_order)? as usize;
        if count.saturating_mul(min_size) > self.remaining() {
            return Err(LandmaskError::InvalidWkb(format!(
                "count {} exceeds the remaining {} bytes",
                count,
                self.remaining()
            )));
        }
        Ok(count)
    }

    fn read_multi_polygon_body(&mut self, byte_order: Endianness) -> Result<MultiPolygon> {
        // numPolygons, each at least a header and a ring count
        let num_polygons = self.read_count(byte_order, 1 + 4 + 4)?;
        let mut polygons = Vec::with_capacity(num_polygons);

        for _ in 0..num_polygons {
            let (byte_order, wkb_type) = self.read_header()?;
            let has_z = match wkb_type {
                WKBType::Polygon => false,
                WKBType::PolygonZ => true,
                other => {
                    return Err(LandmaskError::InvalidWkb(format!(
                        "MultiPolygon member is a {:?}",
                        other
                    )))
                }
            };
            polygons.push(self.read_polygon_body(byte_order, has_z)?);
        }

        Ok(MultiPolygon::new(polygons))
    }

    fn read_polygon_body(&mut self, byte_order: Endianness, has_z: bool) -> Result<Polygon> {
        let num_rings = self.read_count(byte_order, 4)?;
        if num_rings == 0 {
            return Ok(Polygon::new(LineString::new(vec![]), vec![]));
        }

        let exterior = self.read_ring(byte_order, has_z)?;
        let mut interiors = Vec::with_capacity(num_rings - 1);
        for _ in 1..num_rings {
            interiors.push(self.read_ring(byte_order, has_z)?);
        }

        Ok(Polygon::new(exterior, interiors))
    }

    fn read_ring(&mut self, byte_order: Endianness, has_z: bool) -> Result<LineString> {
        let dims = if has_z { 3 } else { 2 };
        let num_points = self.read_count(byte_order, dims * 8)?;

        let mut coords = Vec::with_capacity(num_points);
        for _ in 0..num_points {
            let x = self.read_f64(byte_order)?;
            let y = self.read_f64(byte_order)?;
            if has_z {
                self.read_f64(byte_order)?;
            }
            coords.push(Coord { x, y });
        }

        Ok(LineString::new(coords))
    }
}
