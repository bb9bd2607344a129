use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use geo::{LineString, MultiPolygon, Polygon};

use crate::error::Result;
use crate::io::wkb::common::{Endianness, WKBType};

/// The byte length of a WKBPolygon
fn polygon_wkb_size(geom: &Polygon) -> usize {
    let mut sum = 1 + 4 + 4;
    sum += 4 + (geom.exterior().0.len() * 16);
    for int_ring in geom.interiors() {
        sum += 4 + (int_ring.0.len() * 16);
    }
    sum
}

/// The byte length of a WKBMultiPolygon
pub fn multi_polygon_wkb_size(geom: &MultiPolygon) -> usize {
    let mut sum = 1 + 4 + 4;
    for polygon in geom.iter() {
        sum += polygon_wkb_size(polygon);
    }

    sum
}

fn write_ring<W: Write>(writer: &mut W, ring: &LineString) -> Result<()> {
    writer.write_u32::<LittleEndian>(ring.0.len() as u32)?;
    for coord in ring.coords() {
        writer.write_f64::<LittleEndian>(coord.x)?;
        writer.write_f64::<LittleEndian>(coord.y)?;
    }
    Ok(())
}

/// Write a Polygon geometry to a Writer encoded as WKB
fn write_polygon_as_wkb<W: Write>(writer: &mut W, geom: &Polygon) -> Result<()> {
    // Byte order
    writer.write_u8(Endianness::LittleEndian.into())?;

    // wkbType = 3
    writer.write_u32::<LittleEndian>(WKBType::Polygon.into())?;

    // numRings
    writer.write_u32::<LittleEndian>(1 + geom.interiors().len() as u32)?;

    write_ring(writer, geom.exterior())?;
    for int_ring in geom.interiors() {
        write_ring(writer, int_ring)?;
    }

    Ok(())
}

/// Write a MultiPolygon geometry to a Writer encoded as little-endian WKB
pub fn write_multi_polygon_as_wkb<W: Write>(mut writer: W, geom: &MultiPolygon) -> Result<()> {
    // Byte order
    writer.write_u8(Endianness::LittleEndian.into())?;

    // wkbType = 6
    writer.write_u32::<LittleEndian>(WKBType::MultiPolygon.into())?;

    // numPolygons
    writer.write_u32::<LittleEndian>(geom.0.len() as u32)?;

    for polygon in geom.iter() {
        write_polygon_as_wkb(&mut writer, polygon)?;
    }

    Ok(())
}

/// Encode a MultiPolygon as little-endian WKB.
pub fn to_wkb(geom: &MultiPolygon) -> Vec<u8> {
    let mut buf = Vec::with_capacity(multi_polygon_wkb_size(geom));
    // writing to a Vec cannot fail
    write_multi_polygon_as_wkb(&mut buf, geom).expect("writing WKB into memory");
    buf
}
