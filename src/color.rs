//! Reversible integer RGB/YUV transform.
//!
//! Decorrelates the channels before prediction. The chroma planes are
//! plain differences against green, so they need the signed domain:
//!
//! ```text
//! Y = (R + 2G + B) >> 2      G = Y - ((U + V) >> 2)
//! U = B - G                  R = V + G
//! V = R - G                  B = U + G
//! ```
//!
//! Shifts are arithmetic (floor), which makes the pair exact for every
//! 8-bit triple.

use crate::error::{Error, Result};
use crate::grid::PixelGrid;

fn require_rgb(channels: usize) -> Result<()> {
    if channels != 3 {
        return Err(Error::UnsupportedChannels(channels));
    }
    Ok(())
}

/// Forward transform of one pixel.
#[inline]
pub fn yuv_from_rgb([r, g, b]: [u8; 3]) -> [i16; 3] {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    [(r + 2 * g + b) >> 2, b - g, r - g]
}

/// Inverse transform of one pixel, clamped into 8 bits.
#[inline]
pub fn rgb_from_yuv([y, u, v]: [i16; 3]) -> [u8; 3] {
    let (y, u, v) = (y as i32, u as i32, v as i32);
    let g = y - ((u + v) >> 2);
    let clamp = |c: i32| c.clamp(0, 255) as u8;
    [clamp(v + g), clamp(g), clamp(u + g)]
}

/// Convert an RGB grid to the signed YUV domain.
pub fn rgb_to_yuv(grid: &PixelGrid<u8>) -> Result<PixelGrid<i16>> {
    require_rgb(grid.channels())?;
    let data = grid
        .as_slice()
        .chunks_exact(3)
        .flat_map(|px| yuv_from_rgb([px[0], px[1], px[2]]))
        .collect();
    PixelGrid::from_shape(grid.shape(), data)
}

/// Convert a signed YUV grid back to RGB.
pub fn yuv_to_rgb(grid: &PixelGrid<i16>) -> Result<PixelGrid<u8>> {
    require_rgb(grid.channels())?;
    let data = grid
        .as_slice()
        .chunks_exact(3)
        .flat_map(|px| rgb_from_yuv([px[0], px[1], px[2]]))
        .collect();
    PixelGrid::from_shape(grid.shape(), data)
}
