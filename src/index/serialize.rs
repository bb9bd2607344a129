//! Binary encoding of a [`CompressedIndex`].
//!
//! ```text
//! Header (30 bytes, little endian):
//!   magic: "LMSK" (4B)
//!   version: u16
//!   nx: u32
//!   ny: u32
//!   cardinality: u64
//!   payload_len: u64
//!
//! Payload (payload_len bytes):
//!   RoaringTreemap in the portable roaring serialization
//! ```
//!
//! A bare serialized treemap without this header is the older `.tbmap` asset layout. It carries
//! no grid, so it can only be read with [`CompressedIndex::deserialize_for_grid`].

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use roaring::RoaringTreemap;

use super::CompressedIndex;
use crate::error::{LandmaskError, Result};
use crate::grid::Grid;

/// Magic bytes at the start of a serialized index.
pub const MAGIC: &[u8; 4] = b"LMSK";

/// Current format version.
pub const FORMAT_VERSION: u16 = 2;

const HEADER_BYTES: usize = 4 + 2 + 4 + 4 + 8 + 8;

fn corrupt(msg: impl Into<String>) -> LandmaskError {
    LandmaskError::ResourceCorrupt(msg.into())
}

/// Errors from the roaring decoder are always about the bytes, never about the medium.
fn corrupt_payload(err: io::Error) -> LandmaskError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => corrupt("truncated index"),
        _ => corrupt(format!("invalid index payload: {}", err)),
    }
}

impl CompressedIndex {
    /// The exact number of bytes written by [`CompressedIndex::serialize_into`].
    pub fn serialized_size(&self) -> usize {
        HEADER_BYTES + self.bitmap.serialized_size()
    }

    /// Write the index to a Writer.
    pub fn serialize_into<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        writer.write_u32::<LittleEndian>(self.grid.nx())?;
        writer.write_u32::<LittleEndian>(self.grid.ny())?;
        writer.write_u64::<LittleEndian>(self.bitmap.len())?;
        writer.write_u64::<LittleEndian>(self.bitmap.serialized_size() as u64)?;
        self.bitmap.serialize_into(&mut writer)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        // writing to a Vec cannot fail
        self.serialize_into(&mut buf)
            .expect("serializing into memory");
        buf
    }

    /// Read an index from a Reader, validating every structural invariant.
    ///
    /// Truncated or malformed input yields [`LandmaskError::ResourceCorrupt`].
    pub fn deserialize_from<R: Read>(mut reader: R) -> Result<Self> {
        let magic = read_magic(&mut reader)?;
        if &magic != MAGIC {
            return Err(corrupt("not a landmask index"));
        }
        read_index(reader, None)
    }

    /// Read an index that must be encoded for `expected`.
    ///
    /// The grid is checked before any of the payload is read. Input without the `LMSK` header is
    /// taken as a bare serialized treemap of cells of `expected`.
    pub fn deserialize_for_grid<R: Read>(mut reader: R, expected: Grid) -> Result<Self> {
        let magic = read_magic(&mut reader)?;
        if &magic == MAGIC {
            read_index(reader, Some(expected))
        } else {
            let bitmap = RoaringTreemap::deserialize_from((&magic[..]).chain(reader))
                .map_err(corrupt_payload)?;
            Self::from_treemap(expected, bitmap)
        }
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        Self::deserialize_from(buf)
    }
}

fn read_magic<R: Read>(reader: &mut R) -> Result<[u8; 4]> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => corrupt("truncated index"),
        _ => err.into(),
    })?;
    Ok(magic)
}

/// Everything after the magic.
fn read_index<R: Read>(mut reader: R, expected: Option<Grid>) -> Result<CompressedIndex> {
    let header = (|| -> io::Result<_> {
        let version = reader.read_u16::<LittleEndian>()?;
        let nx = reader.read_u32::<LittleEndian>()?;
        let ny = reader.read_u32::<LittleEndian>()?;
        let cardinality = reader.read_u64::<LittleEndian>()?;
        let payload_len = reader.read_u64::<LittleEndian>()?;
        Ok((version, nx, ny, cardinality, payload_len))
    })();
    let (version, nx, ny, cardinality, payload_len) = header.map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => corrupt("truncated index header"),
        _ => err.into(),
    })?;

    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported index version {}", version)));
    }
    let grid = Grid::try_new(nx, ny).ok_or_else(|| corrupt("index has an empty grid"))?;
    if let Some(expected) = expected {
        if grid != expected {
            return Err(LandmaskError::GridMismatch {
                expected,
                found: grid,
            });
        }
    }
    if cardinality > grid.num_cells() {
        return Err(corrupt(format!(
            "{} cells claimed for grid {}",
            cardinality, grid
        )));
    }

    let mut payload = (&mut reader).take(payload_len);
    let bitmap = RoaringTreemap::deserialize_from(&mut payload).map_err(corrupt_payload)?;
    if payload.limit() != 0 {
        return Err(corrupt("index payload is shorter than its header says"));
    }

    let mut rest = [0u8; 1];
    if reader.read(&mut rest)? != 0 {
        return Err(corrupt("trailing bytes after index"));
    }

    if bitmap.len() != cardinality {
        return Err(corrupt(format!(
            "index header claims {} cells, payload holds {}",
            cardinality,
            bitmap.len()
        )));
    }

    CompressedIndex::from_treemap(grid, bitmap)
}
