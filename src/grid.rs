//! Pixel grids and the two numeric domains the codec works in.
//!
//! A grid is a flat, interleaved buffer indexed
//! `(row * width + col) * channels + channel`. The sample type decides the
//! domain: `u8` is the clamped 8-bit domain, `i16` the unclamped signed
//! domain produced by a reversible colour transform. Everything downstream
//! (prediction, reconstruction) is written once against [`Sample`] and
//! [`PixelSource`].

use std::fmt;

use crate::error::{Error, Result};

/// Numeric domain flag, as stored in both container formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// 8-bit samples, reconstruction clamped to `[0, 255]`.
    Rgb8 = 0,
    /// 16-bit signed samples, no clamping.
    Signed16 = 1,
}

impl Mode {
    /// The on-disk flag.
    pub fn flag(self) -> i32 {
        self as i32
    }

    /// Parse an on-disk flag.
    pub fn from_flag(flag: i32) -> Result<Self> {
        match flag {
            0 => Ok(Mode::Rgb8),
            1 => Ok(Mode::Signed16),
            other => Err(Error::InvalidMode(other)),
        }
    }
}

/// Width, height and channel count of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Interleaved channels per pixel.
    pub channels: usize,
}

impl Shape {
    /// Create a shape.
    pub const fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Number of samples, or `None` if it does not fit in `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.channels)
    }

    /// Check the channel count and return the sample count.
    pub fn validate(&self) -> Result<usize> {
        if self.channels != 1 && self.channels != 3 {
            return Err(Error::UnsupportedChannels(self.channels));
        }
        self.checked_len()
            .ok_or(Error::InvalidHeader("dimensions overflow"))
    }

    /// Flat index of a sample. Caller guarantees the coordinates are in range.
    #[inline]
    pub fn index(&self, x: usize, y: usize, channel: usize) -> usize {
        (y * self.width + x) * self.channels + channel
    }
}

/// A sample type and the clamping policy of its domain.
pub trait Sample: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Container flag for this domain.
    const MODE: Mode;

    /// Widen to the predictor's working integer.
    fn to_i32(self) -> i32;

    /// Bring a rounded least-squares prediction into the domain.
    fn clamp_prediction(predicted: i64) -> i32;

    /// Rebuild a sample from a prediction and its residual.
    fn reconstruct(predicted: i32, residual: i16) -> Self;
}

impl Sample for u8 {
    const MODE: Mode = Mode::Rgb8;

    #[inline]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline]
    fn clamp_prediction(predicted: i64) -> i32 {
        predicted.clamp(0, 255) as i32
    }

    #[inline]
    fn reconstruct(predicted: i32, residual: i16) -> Self {
        (predicted + residual as i32).clamp(0, 255) as u8
    }
}

impl Sample for i16 {
    const MODE: Mode = Mode::Signed16;

    #[inline]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline]
    fn clamp_prediction(predicted: i64) -> i32 {
        // Unclamped: truncates like any other integer narrowing.
        predicted as i32
    }

    #[inline]
    fn reconstruct(predicted: i32, residual: i16) -> Self {
        predicted.wrapping_add(residual as i32) as i16
    }
}

/// Read access to a causal pixel context.
pub trait PixelSource {
    /// Columns.
    fn width(&self) -> usize;
    /// Rows.
    fn height(&self) -> usize;
    /// Interleaved channels per pixel.
    fn channels(&self) -> usize;
    /// Sample at `(x, y)` in `channel`, widened to `i32`.
    fn get(&self, x: usize, y: usize, channel: usize) -> i32;
}

/// Rectangular interleaved pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T: Sample> PixelGrid<T> {
    /// Wrap a flat buffer. Channel count must be 1 or 3.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<T>) -> Result<Self> {
        Self::from_shape(Shape::new(width, height, channels), data)
    }

    /// Wrap a flat buffer with a known shape.
    pub fn from_shape(shape: Shape, data: Vec<T>) -> Result<Self> {
        let expected = shape.validate()?;
        if data.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// All-zero grid.
    pub fn zeroed(shape: Shape) -> Result<Self> {
        let len = shape.validate()?;
        Ok(Self {
            shape,
            data: vec![T::default(); len],
        })
    }

    /// Grid shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.shape.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// Channels per pixel.
    pub fn channels(&self) -> usize {
        self.shape.channels
    }

    /// Flat samples.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Take the flat samples.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Sample at `(x, y)`. Panics when out of range.
    pub fn sample(&self, x: usize, y: usize, channel: usize) -> T {
        self.data[self.shape.index(x, y, channel)]
    }

    pub(crate) fn set_sample(&mut self, x: usize, y: usize, channel: usize, value: T) {
        let idx = self.shape.index(x, y, channel);
        self.data[idx] = value;
    }
}

impl PixelGrid<u8> {
    /// Drop the alpha channel of an interleaved RGBA buffer.
    pub fn strip_alpha(width: usize, height: usize, rgba: &[u8]) -> Result<Self> {
        let pixels = width
            .checked_mul(height)
            .ok_or(Error::InvalidHeader("dimensions overflow"))?;
        if rgba.len() != pixels * 4 {
            return Err(Error::LengthMismatch {
                expected: pixels * 4,
                actual: rgba.len(),
            });
        }
        let data = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Self::new(width, height, 3, data)
    }
}

impl<T: Sample> PixelSource for PixelGrid<T> {
    fn width(&self) -> usize {
        self.shape.width
    }

    fn height(&self) -> usize {
        self.shape.height
    }

    fn channels(&self) -> usize {
        self.shape.channels
    }

    #[inline]
    fn get(&self, x: usize, y: usize, channel: usize) -> i32 {
        self.sample(x, y, channel).to_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_row_major_interleaved() {
        let shape = Shape::new(4, 3, 3);
        assert_eq!(shape.index(0, 0, 0), 0);
        assert_eq!(shape.index(1, 0, 2), 5);
        assert_eq!(shape.index(0, 1, 0), 12);
        assert_eq!(shape.index(3, 2, 2), 35);
    }

    #[test]
    fn test_rejects_bad_channels_and_lengths() {
        assert!(matches!(
            PixelGrid::<u8>::new(2, 2, 4, vec![0; 16]),
            Err(Error::UnsupportedChannels(4))
        ));
        assert!(matches!(
            PixelGrid::<u8>::new(2, 2, 1, vec![0; 3]),
            Err(Error::LengthMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_strip_alpha() {
        let rgba = [1, 2, 3, 255, 4, 5, 6, 0];
        let grid = PixelGrid::strip_alpha(2, 1, &rgba).unwrap();
        assert_eq!(grid.channels(), 3);
        assert_eq!(grid.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_domain_policies() {
        assert_eq!(u8::reconstruct(250, 10), 255);
        assert_eq!(u8::reconstruct(5, -10), 0);
        assert_eq!(u8::clamp_prediction(-7), 0);
        assert_eq!(i16::clamp_prediction(-700), -700);
        assert_eq!(i16::reconstruct(-300, 45), -255);
    }

    #[test]
    fn test_mode_flags() {
        assert_eq!(Mode::from_flag(0).unwrap(), Mode::Rgb8);
        assert_eq!(Mode::Signed16.flag(), 1);
        assert!(matches!(Mode::from_flag(7), Err(Error::InvalidMode(7))));
    }
}
