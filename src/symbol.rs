//! Residual ↔ symbol mapping.
//!
//! Residuals are zigzag-folded so small magnitudes of either sign become
//! small symbol indices. Anything that folds to `MAX_SYM` or above is
//! replaced by [`ESC_SYM`] and its raw value goes to a side list, keeping
//! the entropy alphabet at [`ALPHABET`] symbols.

use crate::error::{Error, Result};

/// Largest symbol value; doubles as the escape marker.
pub const MAX_SYM: u16 = 4095;

/// Marks "take the next value from the escape list".
pub const ESC_SYM: u16 = MAX_SYM;

/// Symbols the coder must represent, escape included.
pub const ALPHABET: usize = MAX_SYM as usize + 1;

/// Interleave sign and magnitude: `0, -1, 1, -2, 2, ...` → `0, 1, 2, 3, 4, ...`.
#[inline]
pub fn zigzag(r: i16) -> u32 {
    let r = r as i32;
    ((r << 1) ^ (r >> 15)) as u32
}

/// Inverse of [`zigzag`]. Only the low 16 bits of `z` are meaningful.
#[inline]
pub fn unzigzag(z: u32) -> i16 {
    ((z >> 1) as i32 ^ -((z & 1) as i32)) as i16
}

/// Symbol stream plus escaped outliers in scan order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Symbolized {
    /// One symbol per residual.
    pub symbols: Vec<u16>,
    /// Raw residuals behind each [`ESC_SYM`].
    pub escapes: Vec<i16>,
}

/// Map residuals to symbols, diverting large ones to the escape list.
pub fn symbolize(residuals: &[i16]) -> Symbolized {
    let mut out = Symbolized {
        symbols: Vec::with_capacity(residuals.len()),
        escapes: Vec::new(),
    };
    for &r in residuals {
        let z = zigzag(r);
        if z < MAX_SYM as u32 {
            out.symbols.push(z as u16);
        } else {
            out.symbols.push(ESC_SYM);
            out.escapes.push(r);
        }
    }
    out
}

/// Reverse [`symbolize`].
///
/// Fails with [`Error::EscapeMismatch`] if the escape list runs out early or
/// has values left over.
pub fn unsymbolize(symbols: &[u16], escapes: &[i16]) -> Result<Vec<i16>> {
    let mut esc = escapes.iter();
    let out = symbols
        .iter()
        .map(|&s| {
            if s == ESC_SYM {
                esc.next().copied().ok_or(Error::EscapeMismatch)
            } else {
                Ok(unzigzag(s as u32))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if esc.next().is_some() {
        return Err(Error::EscapeMismatch);
    }
    Ok(out)
}
