//! Raw residual container (`'R16R'`).
//!
//! The hand-off format between the predictor stage and the entropy stage:
//! a fixed header followed by the residuals as little-endian i16.
//!
//! ```text
//! magic u32 | mode i32 | width i32 | height i32 | channels i32 | count i64 | residuals i16[count]
//! ```

use std::io::{Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::{Mode, Shape};
use crate::wire::{self, field};

/// `'R16R'` read as a little-endian u32.
pub const RESIDUAL_MAGIC: u32 = 0x5231_3652;

const HEADER_LEN: usize = 28;

/// Residuals of one grid, with the metadata needed to rebuild it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResidualRecord {
    /// Numeric domain of the source grid.
    pub mode: Mode,
    /// Shape of the source grid.
    pub shape: Shape,
    /// `actual - predicted` in scan order.
    pub residuals: Vec<i16>,
}

impl ResidualRecord {
    /// Serialize into `w`.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        wire::write_header(&mut w, RESIDUAL_MAGIC, self.mode, self.shape)?;
        w.write_i64::<LittleEndian>(self.residuals.len() as i64)?;
        wire::write_i16s(&mut w, &self.residuals)
    }

    /// Parse from `r`.
    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let header = wire::read_header(&mut r, RESIDUAL_MAGIC)?;
        let mode = Mode::from_flag(header.mode)?;
        let shape = header.shape(1)?;
        let count = field(r.read_i64::<LittleEndian>(), "count")?;
        let count = u64::try_from(count).map_err(|_| Error::InvalidHeader("negative residual count"))?;
        let residuals = wire::read_i16s(&mut r, count, "residuals")?;
        Ok(Self {
            mode,
            shape,
            residuals,
        })
    }

    /// Serialize to an in-memory buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.residuals.len() * 2);
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Write to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        wire::write_file(path, &bytes)?;
        debug!(path = %path.display(), count = self.residuals.len(), "wrote residual file");
        Ok(())
    }

    /// Read a whole file and parse it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = wire::read_file(path)?;
        let record = Self::read_from(bytes.as_slice())?;
        debug!(path = %path.display(), count = record.residuals.len(), "read residual file");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResidualRecord {
        ResidualRecord {
            mode: Mode::Signed16,
            shape: Shape::new(2, 2, 1),
            residuals: vec![0, -1, 300, i16::MIN],
        }
    }

    #[test]
    fn test_layout() {
        let bytes = record().to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 8);
        assert_eq!(&bytes[..4], b"R16R");
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
        assert_eq!(&bytes[20..28], &4i64.to_le_bytes());
        assert_eq!(&bytes[32..34], &300i16.to_le_bytes());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("residuals.r16");
        record().save(&path).unwrap();
        assert_eq!(ResidualRecord::load(&path).unwrap(), record());
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let mut bytes = record().to_bytes().unwrap();
        bytes[8..12].copy_from_slice(&0i32.to_le_bytes());
        assert!(matches!(
            ResidualRecord::read_from(bytes.as_slice()),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_rejects_negative_count() {
        let mut bytes = record().to_bytes().unwrap();
        bytes[20..28].copy_from_slice(&(-1i64).to_le_bytes());
        assert!(matches!(
            ResidualRecord::read_from(bytes.as_slice()),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_rejects_truncation_and_magic() {
        let bytes = record().to_bytes().unwrap();
        assert!(matches!(
            ResidualRecord::read_from(&bytes[..bytes.len() - 1]),
            Err(Error::Truncated { field: "residuals" })
        ));
        assert!(matches!(
            ResidualRecord::read_from(&bytes[..22]),
            Err(Error::Truncated { field: "count" })
        ));
        let mut bad = bytes.clone();
        bad[3] = b'X';
        assert!(matches!(
            ResidualRecord::read_from(bad.as_slice()),
            Err(Error::BadMagic { .. })
        ));
    }
}
