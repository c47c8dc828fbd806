//! End-to-end glue: residuals to entropy records and back, and whole images.

use std::path::Path;

use tracing::debug;

use crate::container::EntropyRecord;
use crate::error::{Error, Result};
use crate::grid::{Mode, PixelGrid, Sample, Shape};
use crate::model::StaticModel;
use crate::predictor::{self, PredictionStats, PredictorParams, Reconstruction};
use crate::rans;
use crate::symbol;

/// What [`compress_to_file`] wrote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackSummary {
    /// Residuals that fell outside the symbol range.
    pub escapes: usize,
    /// Symbols coded.
    pub symbols: usize,
    /// rANS payload size in bytes.
    pub payload_bytes: usize,
}

/// An encoded image and how it was predicted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    /// Serializable entropy record.
    pub record: EntropyRecord,
    /// Path breakdown of the prediction pass.
    pub stats: PredictionStats,
}

/// Entropy-code a residual array.
pub fn pack(residuals: &[i16], mode: Mode, shape: Shape) -> Result<EntropyRecord> {
    let expected = shape.validate()?;
    if residuals.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: residuals.len(),
        });
    }

    let symbol::Symbolized { symbols, escapes } = symbol::symbolize(residuals);
    let model = StaticModel::build(&symbols)?;
    let payload = rans::encode(&symbols, &model)?;

    Ok(EntropyRecord {
        mode,
        shape,
        symbol_count: symbols.len() as u64,
        model,
        escapes,
        payload,
    })
}

/// Decode the residual array held by `record`.
pub fn unpack(record: &EntropyRecord) -> Result<Vec<i16>> {
    let expected = record.shape.validate()?;
    let count = usize::try_from(record.symbol_count)
        .map_err(|_| Error::InvalidHeader("symbol count exceeds usize"))?;
    if count != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: count,
        });
    }
    let symbols = rans::decode(&record.payload, count, &record.model)?;
    symbol::unsymbolize(&symbols, &record.escapes)
}

/// Pack `residuals` and write the record to `path`.
pub fn compress_to_file(
    residuals: &[i16],
    mode: Mode,
    shape: Shape,
    path: impl AsRef<Path>,
) -> Result<PackSummary> {
    let record = pack(residuals, mode, shape)?;
    record.save(path)?;
    let summary = PackSummary {
        escapes: record.escapes.len(),
        symbols: residuals.len(),
        payload_bytes: record.payload.len(),
    };
    debug!(
        escapes = summary.escapes,
        symbols = summary.symbols,
        payload_bytes = summary.payload_bytes,
        "compressed residuals"
    );
    Ok(summary)
}

/// Load a record from `path` and decode its residuals.
pub fn decompress_file(path: impl AsRef<Path>) -> Result<(EntropyRecord, Vec<i16>)> {
    let record = EntropyRecord::load(path)?;
    let residuals = unpack(&record)?;
    Ok((record, residuals))
}

/// Predict and entropy-code a grid.
///
/// The predictor parameters are not stored in the record; decoding needs the
/// same `params`.
pub fn encode_image<T: Sample>(grid: &PixelGrid<T>, params: &PredictorParams) -> Result<EncodedImage> {
    let prediction = predictor::compute_residuals(grid, params)?;
    let record = pack(&prediction.residuals, T::MODE, grid.shape())?;
    Ok(EncodedImage {
        record,
        stats: prediction.stats,
    })
}

/// Decode a record produced by [`encode_image`] with the same `params`.
pub fn decode_image<T: Sample>(record: &EntropyRecord, params: &PredictorParams) -> Result<Reconstruction<T>> {
    if record.mode != T::MODE {
        return Err(Error::ModeMismatch {
            expected: T::MODE,
            found: record.mode,
        });
    }
    let residuals = unpack(record)?;
    predictor::reconstruct(&residuals, record.shape, params)
}
