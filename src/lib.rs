//! # Predictive lossless image coding with rANS
//!
//! *Spatial prediction, a static model, one byte-wise rANS stream.*
//!
//! ## Intuition First
//!
//! Neighbouring pixels look alike. If every sample is replaced by how far it
//! lands from a guess built out of its already-seen neighbours, most of what
//! remains is a pile of small numbers clustered around zero. A skewed
//! distribution like that is exactly what an entropy coder feeds on.
//!
//! ## Pipeline
//!
//! ```text
//! PixelGrid<T> ──predict──▶ residuals i16 ──symbolize──▶ symbols u16 + escapes i16
//!                                                           │
//!                                  StaticModel::build ◀─────┤
//!                                                           ▼
//!                                   rans::encode ──▶ EntropyRecord ('RANS' file)
//! ```
//!
//! Decoding runs the same chain backwards. The predictor only ever looks at
//! samples that precede the current one in raster order, so the decoder can
//! rebuild the exact same prediction from what it has already decoded.
//!
//! ## Predictors
//!
//! - **MED** (median edge detector): picks left, above, or a planar blend,
//!   depending on whether the above-left neighbour hints at an edge.
//! - **Least squares**: fits linear weights over a small causal window with
//!   ridge-regularised normal equations, falling back to MED when the window
//!   is too small or the system is singular.
//!
//! Two numeric domains share that code through [`Sample`]: `u8` grids clamp
//! to `[0, 255]`, `i16` grids (for instance after [`color::rgb_to_yuv`])
//! do not clamp at all.
//!
//! ## Symbols and escapes
//!
//! Residuals fold onto non-negative integers with zigzag (`0, -1, 1, -2,
//! ...`). Anything that lands at or past [`symbol::ESC_SYM`] is coded as
//! the escape symbol and its raw value goes to a side list.
//!
//! ## Entropy coding
//!
//! The model counts symbols once and scales them to a frequency table over
//! `2^16` with every entry at least one. [`rans`] then codes the symbols with
//! a 32-bit state renormalised a byte at a time; the final state is flushed
//! at the end of the buffer and the decoder reads the buffer from its tail.
//!
//! ## Failure Modes
//!
//! 1. **Wrapped residuals**: an `i16` grid whose residual exceeds the i16
//!    range wraps; the pass logs a warning and stays lossless for the
//!    decoder, which wraps the same way.
//! 2. **Mismatched parameters**: predictor parameters are not stored in the
//!    container. Decoding with different ones yields a different image.
//!
//! ## Example
//!
//! ```
//! use pixans::{decode_image, encode_image, PixelGrid, PredictorParams};
//!
//! let grid = PixelGrid::new(2, 2, 1, vec![10u8, 12, 11, 13]).unwrap();
//! let params = PredictorParams::med();
//! let encoded = encode_image(&grid, &params).unwrap();
//! let decoded = decode_image::<u8>(&encoded.record, &params).unwrap();
//! assert_eq!(decoded.grid, grid);
//! ```
//!
//! ## References
//!
//! - Weinberger, M., Seroussi, G., Sapiro, G. (2000). "The LOCO-I lossless image compression algorithm."
//! - Duda, J. (2013). "Asymmetric numeral systems: entropy coding combining speed of Huffman coding with compression rate of arithmetic coding."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod color;
pub mod container;
pub mod error;
pub mod grid;
pub mod model;
pub mod pipeline;
pub mod predictor;
pub mod rans;
pub mod residual_file;
pub mod solver;
pub mod symbol;
mod wire;

pub use container::EntropyRecord;
pub use error::{Error, Result};
pub use grid::{Mode, PixelGrid, PixelSource, Sample, Shape};
pub use model::StaticModel;
pub use pipeline::{
    compress_to_file, decode_image, decompress_file, encode_image, pack, unpack, EncodedImage,
    PackSummary,
};
pub use predictor::{PredictionStats, PredictorKind, PredictorParams, Reconstruction};
pub use rans::{RansDecoder, RansEncoder};
pub use residual_file::ResidualRecord;
