//! Range Asymmetric Numeral Systems (rANS), byte-oriented.
//!
//! rANS keeps the whole coder state in one integer and updates it with a
//! multiply/divide against the symbol's frequency. This variant carries a
//! 32-bit state, renormalises one byte at a time, and codes against a
//! [`StaticModel`] with [`PROB_BITS`] of precision.
//!
//! ## Stack discipline
//!
//! ANS is last-in, first-out. The encoder therefore walks the symbols in
//! reverse and appends bytes to a single buffer; the decoder walks symbols
//! forward and pops bytes from the tail of that same buffer. No framing or
//! side index is needed.
//!
//! ```text
//! encode:  s[n-1] ... s[1] s[0]   → bytes: renorm.. renorm.. | x0 x1 x2 x3
//! decode:  s[0] s[1] ... s[n-1]   ← pops:  x3 x2 x1 x0, then renorm bytes
//! ```
//!
//! ## State interval
//!
//! Normalised states live in `[RANS_L, 2^32)` with `RANS_L = 2^24`. Before
//! coding a symbol of frequency `f` the encoder shifts bytes out while
//! `x >= f << (32 - PROB_BITS)`, which is exactly the range that maps back
//! into the interval, so the decoder can refill while `x < RANS_L` and
//! read the same number of bytes back.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{StaticModel, PROB_BITS, PROB_SCALE};
use crate::symbol::ALPHABET;

/// Lower bound of the normalised state interval.
pub const RANS_L: u32 = 1 << 24;

/// Cap on the output preallocation driven by an untrusted symbol count.
const PREALLOC_LIMIT: usize = 1 << 22;

/// rANS encoder.
pub struct RansEncoder {
    state: u32,
    output: Vec<u8>,
}

impl RansEncoder {
    /// Create a new rANS encoder.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an encoder with room for `bytes` of output.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            state: RANS_L,
            output: Vec::with_capacity(bytes),
        }
    }

    /// Push a symbol with the given cumulative frequency and frequency.
    ///
    /// Symbols must be pushed in reverse of the order they will be decoded.
    ///
    /// # Errors
    /// Returns `Error::ZeroFrequency` if `freq` is 0.
    pub fn encode(&mut self, cum_freq: u32, freq: u32) -> Result<()> {
        if freq == 0 {
            return Err(Error::ZeroFrequency);
        }

        // Renormalize: x must be below f << (32 - PROB_BITS) before encoding.
        let x_max = (freq as u64) << (32 - PROB_BITS);
        while self.state as u64 >= x_max {
            self.output.push(self.state as u8);
            self.state >>= 8;
        }

        // state = (x / freq) * M + (x % freq) + cum_freq
        self.state = ((self.state / freq) << PROB_BITS) + (self.state % freq) + cum_freq;
        Ok(())
    }

    /// Flush the state (low byte first) and return the byte stream.
    pub fn finish(mut self) -> Vec<u8> {
        self.output.extend_from_slice(&self.state.to_le_bytes());
        self.output
    }

    /// Return the current internal state.
    pub fn get_state(&self) -> u32 {
        self.state
    }
}

impl Default for RansEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// rANS decoder reading a byte stream from its tail.
pub struct RansDecoder<'a> {
    state: u32,
    input: &'a [u8],
    pos: usize,
}

impl<'a> RansDecoder<'a> {
    /// Restore the encoder's final state from the last four bytes.
    ///
    /// # Errors
    /// Returns `Error::RansUnderflow` if fewer than four bytes are available.
    pub fn new(input: &'a [u8]) -> Result<Self> {
        let mut dec = Self {
            state: 0,
            input,
            pos: input.len(),
        };
        for _ in 0..4 {
            let b = dec.pop()?;
            dec.state = (dec.state << 8) | b as u32;
        }
        Ok(dec)
    }

    #[inline]
    fn pop(&mut self) -> Result<u8> {
        if self.pos == 0 {
            return Err(Error::RansUnderflow);
        }
        self.pos -= 1;
        Ok(self.input[self.pos])
    }

    /// Return the current internal state.
    pub fn get_state(&self) -> u32 {
        self.state
    }

    /// Slot in `[0, PROB_SCALE)` selecting the next symbol.
    #[inline]
    pub fn slot(&self) -> u32 {
        self.state & (PROB_SCALE - 1)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.pos
    }

    /// Pop the symbol owning the current slot and refill the state.
    ///
    /// `cum_freq` and `freq` must belong to the symbol that owns
    /// [`slot`](Self::slot).
    ///
    /// # Errors
    /// Returns `Error::RansUnderflow` if the refill runs past the start of
    /// the buffer.
    pub fn decode(&mut self, cum_freq: u32, freq: u32) -> Result<()> {
        let slot = self.slot();
        debug_assert!(slot >= cum_freq && slot - cum_freq < freq);

        // state = freq * (state / M) + (state % M) - cum_freq
        self.state = freq * (self.state >> PROB_BITS) + (slot - cum_freq);

        // Renormalize
        while self.state < RANS_L {
            let b = self.pop()?;
            self.state = (self.state << 8) | b as u32;
        }
        Ok(())
    }
}

/// Encode `symbols` against `model`.
pub fn encode(symbols: &[u16], model: &StaticModel) -> Result<Vec<u8>> {
    let mut encoder = RansEncoder::with_capacity(symbols.len() / 2 + 16);
    for &s in symbols.iter().rev() {
        if s as usize >= ALPHABET {
            return Err(Error::SymbolOutOfRange(s as u32));
        }
        encoder.encode(model.cum_freq(s), model.freq(s))?;
    }
    let bytes = encoder.finish();
    debug!(symbols = symbols.len(), bytes = bytes.len(), "rANS encoded");
    Ok(bytes)
}

/// Decode `count` symbols from `bytes` against `model`.
pub fn decode(bytes: &[u8], count: usize, model: &StaticModel) -> Result<Vec<u16>> {
    let mut decoder = RansDecoder::new(bytes)?;
    let mut out = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        let s = model.lookup(decoder.slot());
        decoder.decode(model.cum_freq(s), model.freq(s))?;
        out.push(s);
    }
    if decoder.remaining() != 0 || decoder.get_state() != RANS_L {
        debug!(
            leftover = decoder.remaining(),
            state = decoder.get_state(),
            "rANS payload not fully consumed"
        );
    }
    Ok(out)
}
