//! Entropy container: everything needed to decode one residual array.
//!
//! Layout (little-endian, in order):
//!
//! ```text
//! magic u32 ('RANS') | mode i32 | width i32 | height i32 | channels i32
//! symbol_count u64 | L u32 | alphabet_size u32 | freq u16[alphabet_size]
//! escape_count u64 | escape_byte_len u64 | entropy_byte_len u64
//! escapes i16[escape_count] | entropy u8[entropy_byte_len]
//! ```
//!
//! `L` holds the model's total, [`PROB_SCALE`] (2^16), not the alphabet
//! size. Only the frequency table is stored; the cumulative and lookup
//! tables are rebuilt on load.

use std::io::{Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::{Mode, Shape};
use crate::model::{StaticModel, PROB_SCALE};
use crate::wire::{self, field};

/// `'RANS'` read as a little-endian u32.
pub const ENTROPY_MAGIC: u32 = 0x534E_4152;

/// A serialized residual array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntropyRecord {
    /// Numeric domain of the residuals.
    pub mode: Mode,
    /// Shape of the grid the residuals came from.
    pub shape: Shape,
    /// Symbols coded in `payload`.
    pub symbol_count: u64,
    /// Static model the payload was coded with.
    pub model: StaticModel,
    /// Raw residuals behind escape symbols, in scan order.
    pub escapes: Vec<i16>,
    /// rANS byte stream.
    pub payload: Vec<u8>,
}

impl EntropyRecord {
    /// Serialize into `w`.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        let freq = self.model.frequencies();
        wire::write_header(&mut w, ENTROPY_MAGIC, self.mode, self.shape)?;
        w.write_u64::<LittleEndian>(self.symbol_count)?;
        w.write_u32::<LittleEndian>(PROB_SCALE)?;
        w.write_u32::<LittleEndian>(freq.len() as u32)?;
        for &f in freq {
            w.write_u16::<LittleEndian>(f)?;
        }
        let escape_count = self.escapes.len() as u64;
        w.write_u64::<LittleEndian>(escape_count)?;
        w.write_u64::<LittleEndian>(escape_count * 2)?;
        w.write_u64::<LittleEndian>(self.payload.len() as u64)?;
        wire::write_i16s(&mut w, &self.escapes)?;
        w.write_all(&self.payload)?;
        Ok(())
    }

    /// Parse from `r`.
    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let header = wire::read_header(&mut r, ENTROPY_MAGIC)?;
        let mode = Mode::from_flag(header.mode)?;
        let shape = header.shape(0)?;
        let symbol_count = field(r.read_u64::<LittleEndian>(), "symbol_count")?;

        let scale = field(r.read_u32::<LittleEndian>(), "L")?;
        if scale != PROB_SCALE {
            return Err(Error::InvalidModel("unsupported probability scale"));
        }
        let alphabet = field(r.read_u32::<LittleEndian>(), "alphabet_size")?;
        let raw = wire::read_bytes(&mut r, alphabet as u64 * 2, "frequency_table")?;
        let freq = raw
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        let model = StaticModel::from_frequencies(freq)?;

        let escape_count = field(r.read_u64::<LittleEndian>(), "escape_count")?;
        let escape_bytes = field(r.read_u64::<LittleEndian>(), "escape_byte_len")?;
        let payload_len = field(r.read_u64::<LittleEndian>(), "entropy_byte_len")?;
        if escape_count.checked_mul(2) != Some(escape_bytes) {
            return Err(Error::InvalidHeader("escape byte length disagrees with count"));
        }
        let escapes = wire::read_i16s(&mut r, escape_count, "escape_values")?;
        let payload = wire::read_bytes(&mut r, payload_len, "entropy_bytes")?;

        Ok(Self {
            mode,
            shape,
            symbol_count,
            model,
            escapes,
            payload,
        })
    }

    /// Serialize to an in-memory buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Parse an in-memory buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from(bytes)
    }

    /// Size of the serialized record in bytes.
    pub fn encoded_len(&self) -> usize {
        20 + 8 + 8 + self.model.frequencies().len() * 2 + 24 + self.escapes.len() * 2 + self.payload.len()
    }

    /// Write to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        wire::write_file(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote entropy container");
        Ok(())
    }

    /// Read a whole file and parse it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = wire::read_file(path)?;
        let record = Self::from_bytes(&bytes)?;
        debug!(
            path = %path.display(),
            bytes = bytes.len(),
            symbols = record.symbol_count,
            escapes = record.escapes.len(),
            "read entropy container"
        );
        Ok(record)
    }
}
