//! Semi-static frequency model.
//!
//! The model is fit once over the complete symbol sequence, normalised so
//! frequencies sum to exactly [`PROB_SCALE`], and shipped verbatim to the
//! decoder. Every symbol, seen or not, keeps a frequency of at least one so
//! the lookup table is dense and any symbol of the alphabet stays
//! encodable.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::trace;

use crate::error::{Error, Result};
use crate::symbol::ALPHABET;

/// Precision in bits of the frequency table.
pub const PROB_BITS: u32 = 16;

/// Total of the frequency table (`M = 2^PROB_BITS`).
pub const PROB_SCALE: u32 = 1 << PROB_BITS;

/// Frequency table with its cumulative table and slot → symbol lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticModel {
    freq: Vec<u16>,
    cdf: Vec<u32>,
    lut: Vec<u16>,
}

impl StaticModel {
    /// Fit a model to `symbols`. All values must be below [`ALPHABET`].
    pub fn build(symbols: &[u16]) -> Result<Self> {
        let mut counts = vec![0u64; ALPHABET];
        for &s in symbols {
            *counts
                .get_mut(s as usize)
                .ok_or(Error::SymbolOutOfRange(s as u32))? += 1;
        }

        let mut total: u64 = symbols.len() as u64;
        if total == 0 {
            counts[0] = PROB_SCALE as u64;
            total = PROB_SCALE as u64;
        }

        let scale = PROB_SCALE as f64;
        let mut freq: Vec<u32> = counts
            .iter()
            .map(|&c| ((c as f64 / total as f64) * scale).round().max(1.0) as u32)
            .collect();

        let mut sum: u32 = freq.iter().sum();
        let drift = sum as i64 - PROB_SCALE as i64;
        if sum > PROB_SCALE {
            // Largest first, lowest index on ties.
            let mut heap: BinaryHeap<(u32, Reverse<usize>)> =
                freq.iter().enumerate().map(|(i, &f)| (f, Reverse(i))).collect();
            while sum > PROB_SCALE {
                let Some((f, Reverse(idx))) = heap.pop() else {
                    break;
                };
                if f <= 1 {
                    break;
                }
                freq[idx] -= 1;
                sum -= 1;
                heap.push((f - 1, Reverse(idx)));
            }
        } else if sum < PROB_SCALE {
            // Smallest first, lowest index on ties.
            let mut heap: BinaryHeap<Reverse<(u32, usize)>> =
                freq.iter().enumerate().map(|(i, &f)| Reverse((f, i))).collect();
            while sum < PROB_SCALE {
                let Some(Reverse((f, idx))) = heap.pop() else {
                    break;
                };
                freq[idx] += 1;
                sum += 1;
                heap.push(Reverse((f + 1, idx)));
            }
        }
        trace!(drift, "normalised frequency table");

        // The floor of one per symbol caps any entry at PROB_SCALE - (ALPHABET - 1).
        let freq = freq.into_iter().map(|f| f as u16).collect();
        Self::from_frequencies(freq)
    }

    /// Rebuild the derived tables from a stored frequency table.
    pub fn from_frequencies(freq: Vec<u16>) -> Result<Self> {
        if freq.len() != ALPHABET {
            return Err(Error::InvalidModel("frequency table has the wrong length"));
        }
        if freq.contains(&0) {
            return Err(Error::InvalidModel("zero frequency in table"));
        }
        let sum: u64 = freq.iter().map(|&f| f as u64).sum();
        if sum != PROB_SCALE as u64 {
            return Err(Error::InvalidModel("frequencies do not sum to the scale"));
        }

        let mut cdf = Vec::with_capacity(ALPHABET);
        let mut lut = vec![0u16; PROB_SCALE as usize];
        let mut acc = 0u32;
        for (s, &f) in freq.iter().enumerate() {
            cdf.push(acc);
            let start = acc as usize;
            lut[start..start + f as usize].fill(s as u16);
            acc += f as u32;
        }
        Ok(Self { freq, cdf, lut })
    }

    /// Frequency per symbol.
    pub fn frequencies(&self) -> &[u16] {
        &self.freq
    }

    /// Exclusive prefix sum of the frequencies.
    pub fn cumulative(&self) -> &[u32] {
        &self.cdf
    }

    /// Frequency of `symbol`.
    #[inline]
    pub fn freq(&self, symbol: u16) -> u32 {
        self.freq[symbol as usize] as u32
    }

    /// Cumulative frequency of `symbol`.
    #[inline]
    pub fn cum_freq(&self, symbol: u16) -> u32 {
        self.cdf[symbol as usize]
    }

    /// Symbol owning `slot` (`slot < PROB_SCALE`).
    #[inline]
    pub fn lookup(&self, slot: u32) -> u16 {
        self.lut[slot as usize]
    }
}
