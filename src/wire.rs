//! Little-endian field helpers shared by the container formats.

use std::io::{self, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::grid::{Mode, Shape};

/// Map a short read to `Error::Truncated` naming the field.
pub(crate) fn field<T>(res: io::Result<T>, name: &'static str) -> Result<T> {
    res.map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated { field: name },
        _ => Error::Io(e),
    })
}

/// Read exactly `len` bytes without trusting `len` for the allocation.
pub(crate) fn read_bytes<R: Read>(r: &mut R, len: u64, name: &'static str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(Error::Truncated { field: name });
    }
    Ok(buf)
}

/// Read `count` little-endian i16 values.
pub(crate) fn read_i16s<R: Read>(r: &mut R, count: u64, name: &'static str) -> Result<Vec<i16>> {
    let len = count
        .checked_mul(2)
        .ok_or(Error::InvalidHeader("array length overflows"))?;
    let bytes = read_bytes(r, len, name)?;
    Ok(bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

pub(crate) fn write_i16s<W: Write>(w: &mut W, values: &[i16]) -> Result<()> {
    for &v in values {
        w.write_i16::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Magic, then `mode | width | height | channels` as i32.
pub(crate) fn write_header<W: Write>(w: &mut W, magic: u32, mode: Mode, shape: Shape) -> Result<()> {
    w.write_u32::<LittleEndian>(magic)?;
    w.write_i32::<LittleEndian>(mode.flag())?;
    for dim in [shape.width, shape.height, shape.channels] {
        let dim = i32::try_from(dim).map_err(|_| Error::InvalidHeader("dimension exceeds i32"))?;
        w.write_i32::<LittleEndian>(dim)?;
    }
    Ok(())
}

/// Raw header fields, checked against `magic` only.
pub(crate) struct RawHeader {
    pub(crate) mode: i32,
    pub(crate) dims: [i32; 3],
}

pub(crate) fn read_header<R: Read>(r: &mut R, magic: u32) -> Result<RawHeader> {
    let found = field(r.read_u32::<LittleEndian>(), "magic")?;
    if found != magic {
        return Err(Error::BadMagic {
            expected: magic,
            found,
        });
    }
    let mode = field(r.read_i32::<LittleEndian>(), "mode")?;
    let width = field(r.read_i32::<LittleEndian>(), "width")?;
    let height = field(r.read_i32::<LittleEndian>(), "height")?;
    let channels = field(r.read_i32::<LittleEndian>(), "channels")?;
    Ok(RawHeader {
        mode,
        dims: [width, height, channels],
    })
}

impl RawHeader {
    /// Shape from the stored dimensions; `min` is the smallest accepted value.
    pub(crate) fn shape(&self, min: i32) -> Result<Shape> {
        if self.dims.iter().any(|&d| d < min) {
            return Err(Error::InvalidHeader("dimension out of range"));
        }
        let [w, h, c] = self.dims;
        Ok(Shape::new(w as usize, h as usize, c as usize))
    }
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}
