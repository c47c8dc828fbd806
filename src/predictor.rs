//! Causal pixel prediction.
//!
//! Two predictors share one raster walk:
//!
//! - **MED** (median edge detector) looks at the left (`A`), above (`B`) and
//!   above-left (`C`) neighbours and picks `min(A,B)`, `max(A,B)` or the
//!   planar estimate `A + B - C` depending on where `C` falls.
//! - **LS** fits a linear predictor per pixel by least squares over a small
//!   causal window, solving the ridge-regularized normal equations with
//!   [`gauss_jordan`](crate::solver::gauss_jordan). Whenever the window is
//!   too sparse or the system is singular it falls back to MED; that is the
//!   normal path along image borders, not an error.
//!
//! Encoding and decoding read neighbours from the same context buffer,
//! filled with reconstructed samples in raster order (row, column,
//! channel). The encoder never looks at original samples other than the
//! one it is currently coding, so the decoder derives the exact same
//! predictions.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::grid::{PixelGrid, PixelSource, Sample, Shape};
use crate::solver::{gauss_jordan, DEFAULT_RIDGE};

/// Largest supported LS neighbour vector.
pub const MAX_ORDER: usize = 4;

/// Neighbour offsets `(dx, dy)` in LS vector order: left, above,
/// above-left, above-right.
const NEIGHBOR_OFFSETS: [(isize, isize); MAX_ORDER] = [(-1, 0), (0, -1), (-1, -1), (1, -1)];

/// Which predictor a pass runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PredictorKind {
    /// Fixed median edge detector.
    #[default]
    Med,
    /// Per-pixel least-squares fit with MED fallback.
    LeastSquares,
}

/// Predictor configuration.
///
/// Not stored in containers: the decoder must be handed the same values
/// the encoder used.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PredictorParams {
    /// Predictor variant.
    pub kind: PredictorKind,
    /// LS neighbour count `N`, `1..=4`.
    pub order: usize,
    /// LS window columns to the left of the current pixel.
    pub window_width: usize,
    /// LS window rows above the current row.
    pub window_height: usize,
    /// Ridge term added to the normal-equation diagonal.
    pub ridge: f64,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            kind: PredictorKind::Med,
            order: MAX_ORDER,
            window_width: 4,
            window_height: 4,
            ridge: DEFAULT_RIDGE,
        }
    }
}

impl PredictorParams {
    /// Fixed MED predictor.
    pub fn med() -> Self {
        Self::default()
    }

    /// Least-squares predictor with a 4x4 window over all four neighbours.
    pub fn least_squares() -> Self {
        Self {
            kind: PredictorKind::LeastSquares,
            ..Self::default()
        }
    }

    /// Set the LS neighbour count.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set the LS window size.
    pub fn with_window(mut self, width: usize, height: usize) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set the ridge term.
    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_ORDER).contains(&self.order) {
            return Err(Error::InvalidParams("order must be in 1..=4"));
        }
        if !self.ridge.is_finite() || self.ridge < 0.0 {
            return Err(Error::InvalidParams("ridge must be finite and non-negative"));
        }
        Ok(())
    }
}

/// How many samples each path predicted during one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PredictionStats {
    /// Resolved by the least-squares fit.
    pub adaptive: usize,
    /// Resolved by MED (including LS fallbacks).
    pub fixed: usize,
}

impl PredictionStats {
    /// Samples predicted.
    pub fn total(&self) -> usize {
        self.adaptive + self.fixed
    }

    /// Fraction resolved by LS, `0.0` for an empty pass.
    pub fn adaptive_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.adaptive as f64 / total as f64,
        }
    }
}

/// Output of [`compute_residuals`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prediction {
    /// `actual - predicted` per sample, grid indexing.
    pub residuals: Vec<i16>,
    /// Path breakdown.
    pub stats: PredictionStats,
}

/// Output of [`reconstruct`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconstruction<T> {
    /// Rebuilt grid.
    pub grid: PixelGrid<T>,
    /// Path breakdown; identical to the encoder's.
    pub stats: PredictionStats,
}

/// Median edge detector over left `a`, above `b`, above-left `c`.
#[inline]
pub fn med_predict(a: i32, b: i32, c: i32) -> i32 {
    if c >= a.max(b) {
        a.min(b)
    } else if c <= a.min(b) {
        a.max(b)
    } else {
        a + b - c
    }
}

fn med_at<S: PixelSource>(src: &S, x: usize, y: usize, ch: usize) -> i32 {
    let a = if x > 0 { src.get(x - 1, y, ch) } else { 0 };
    let b = if y > 0 { src.get(x, y - 1, ch) } else { 0 };
    let c = if x > 0 && y > 0 {
        src.get(x - 1, y - 1, ch)
    } else {
        0
    };
    med_predict(a, b, c)
}

/// Fill `out` with the first `out.len()` neighbours of `(x, y)`.
/// Returns `false` if any of them lies outside the grid.
fn neighbors<S: PixelSource>(src: &S, x: usize, y: usize, ch: usize, out: &mut [f64]) -> bool {
    for (slot, &(dx, dy)) in out.iter_mut().zip(NEIGHBOR_OFFSETS.iter()) {
        let xi = x as isize + dx;
        let yi = y as isize + dy;
        if xi < 0 || yi < 0 || xi as usize >= src.width() || yi as usize >= src.height() {
            return false;
        }
        *slot = src.get(xi as usize, yi as usize, ch) as f64;
    }
    true
}

/// Scratch space for one LS fit. Sized for [`MAX_ORDER`], sliced to `order`.
struct LeastSquares {
    order: usize,
    window_width: usize,
    window_height: usize,
    ridge: f64,
    ata: [f64; MAX_ORDER * MAX_ORDER],
    aty: [f64; MAX_ORDER],
    sample: [f64; MAX_ORDER],
    current: [f64; MAX_ORDER],
}

impl LeastSquares {
    fn new(params: &PredictorParams) -> Self {
        Self {
            order: params.order,
            window_width: params.window_width,
            window_height: params.window_height,
            ridge: params.ridge,
            ata: [0.0; MAX_ORDER * MAX_ORDER],
            aty: [0.0; MAX_ORDER],
            sample: [0.0; MAX_ORDER],
            current: [0.0; MAX_ORDER],
        }
    }

    /// Accumulate `AᵗA` and `Aᵗy` over the causal window; returns the
    /// number of usable samples.
    fn accumulate<S: PixelSource>(&mut self, src: &S, x: usize, y: usize, ch: usize) -> usize {
        let n = self.order;
        let ata = &mut self.ata[..n * n];
        let aty = &mut self.aty[..n];
        let v = &mut self.sample[..n];
        ata.fill(0.0);
        aty.fill(0.0);

        let mut count = 0;
        let x0 = x.saturating_sub(self.window_width);
        for yy in y.saturating_sub(self.window_height)..=y {
            for xx in x0..x {
                if !neighbors(src, xx, yy, ch, v) {
                    continue;
                }
                let target = src.get(xx, yy, ch) as f64;
                for i in 0..n {
                    aty[i] += v[i] * target;
                    for j in 0..n {
                        ata[i * n + j] += v[i] * v[j];
                    }
                }
                count += 1;
            }
        }
        count
    }

    fn predict<T: Sample, S: PixelSource>(
        &mut self,
        src: &S,
        x: usize,
        y: usize,
        ch: usize,
    ) -> Option<i32> {
        let n = self.order;
        if !neighbors(src, x, y, ch, &mut self.current[..n]) {
            return None;
        }
        if self.accumulate(src, x, y, ch) < n + 2 {
            return None;
        }
        let mut w = self.aty;
        if !gauss_jordan(&mut self.ata[..n * n], &mut w[..n], self.ridge) {
            return None;
        }
        let p: f64 = w[..n]
            .iter()
            .zip(&self.current[..n])
            .map(|(wi, ni)| wi * ni)
            .sum();
        Some(T::clamp_prediction(p.round() as i64))
    }
}

/// One pass worth of predictor state.
struct Engine {
    kind: PredictorKind,
    ls: LeastSquares,
    stats: PredictionStats,
}

impl Engine {
    fn new(params: &PredictorParams) -> Self {
        Self {
            kind: params.kind,
            ls: LeastSquares::new(params),
            stats: PredictionStats::default(),
        }
    }

    fn predict<T: Sample, S: PixelSource>(&mut self, src: &S, x: usize, y: usize, ch: usize) -> i32 {
        if self.kind == PredictorKind::LeastSquares {
            if let Some(p) = self.ls.predict::<T, S>(src, x, y, ch) {
                self.stats.adaptive += 1;
                return p;
            }
        }
        self.stats.fixed += 1;
        med_at(src, x, y, ch)
    }
}

/// Walk `shape` in raster order. `step(index, predicted)` returns the
/// reconstructed sample, which is written into the causal context before
/// the walk moves on.
fn walk<T, F>(shape: Shape, params: &PredictorParams, mut step: F) -> Result<(PixelGrid<T>, PredictionStats)>
where
    T: Sample,
    F: FnMut(usize, i32) -> T,
{
    params.validate()?;
    let mut ctx = PixelGrid::<T>::zeroed(shape)?;
    let mut engine = Engine::new(params);
    for y in 0..shape.height {
        for x in 0..shape.width {
            for ch in 0..shape.channels {
                let predicted = engine.predict::<T, _>(&ctx, x, y, ch);
                let value = step(shape.index(x, y, ch), predicted);
                ctx.set_sample(x, y, ch, value);
            }
        }
    }
    Ok((ctx, engine.stats))
}

/// Predict every sample of `grid` and return `actual - predicted`.
pub fn compute_residuals<T: Sample>(grid: &PixelGrid<T>, params: &PredictorParams) -> Result<Prediction> {
    let samples = grid.as_slice();
    let mut residuals = vec![0i16; samples.len()];
    let mut wrapped = 0usize;

    let (_, stats) = walk::<T, _>(grid.shape(), params, |idx, predicted| {
        let diff = samples[idx].to_i32().wrapping_sub(predicted);
        let r = diff as i16;
        if r as i32 != diff {
            wrapped += 1;
        }
        residuals[idx] = r;
        T::reconstruct(predicted, r)
    })?;

    if wrapped > 0 {
        warn!(wrapped, "residuals exceeded i16 range and wrapped");
    }
    debug!(
        kind = ?params.kind,
        adaptive = stats.adaptive,
        fixed = stats.fixed,
        "residuals computed"
    );
    Ok(Prediction { residuals, stats })
}

/// Rebuild a grid of `shape` from residuals produced with the same params.
pub fn reconstruct<T: Sample>(
    residuals: &[i16],
    shape: Shape,
    params: &PredictorParams,
) -> Result<Reconstruction<T>> {
    let expected = shape.validate()?;
    if residuals.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: residuals.len(),
        });
    }

    let (grid, stats) = walk::<T, _>(shape, params, |idx, predicted| {
        T::reconstruct(predicted, residuals[idx])
    })?;

    debug!(
        kind = ?params.kind,
        adaptive = stats.adaptive,
        fixed = stats.fixed,
        "grid reconstructed"
    );
    Ok(Reconstruction { grid, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gradient(w: usize, h: usize) -> PixelGrid<u8> {
        let mut data = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                data.push((x * 255 / w.max(2).saturating_sub(1)) as u8);
                data.push((y * 255 / h.max(2).saturating_sub(1)) as u8);
                data.push(((x + y) * 4) as u8);
            }
        }
        PixelGrid::new(w, h, 3, data).unwrap()
    }

    fn noise(w: usize, h: usize, channels: usize, mut seed: u32) -> Vec<u8> {
        (0..w * h * channels)
            .map(|_| {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (seed >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_med_cases() {
        // C above both: take the smaller.
        assert_eq!(med_predict(10, 20, 30), 10);
        // C below both: take the larger.
        assert_eq!(med_predict(10, 20, 5), 20);
        // In between: planar.
        assert_eq!(med_predict(10, 20, 15), 15);
        assert_eq!(med_predict(0, 0, 0), 0);
    }

    #[test]
    fn test_constant_image_only_seed_pixel_has_residual() {
        let data: Vec<u8> = (0..16).flat_map(|_| [10, 20, 30]).collect();
        let grid = PixelGrid::new(4, 4, 3, data).unwrap();
        let pred = compute_residuals(&grid, &PredictorParams::med()).unwrap();
        assert_eq!(&pred.residuals[..3], &[10, 20, 30]);
        assert!(pred.residuals[3..].iter().all(|&r| r == 0));
        assert_eq!(pred.stats.fixed, 48);
        assert_eq!(pred.stats.adaptive, 0);
    }

    #[test]
    fn test_med_roundtrip_u8() {
        let grid = PixelGrid::new(13, 7, 3, noise(13, 7, 3, 7)).unwrap();
        let params = PredictorParams::med();
        let pred = compute_residuals(&grid, &params).unwrap();
        let rec = reconstruct::<u8>(&pred.residuals, grid.shape(), &params).unwrap();
        assert_eq!(rec.grid, grid);
        assert_eq!(rec.stats, pred.stats);
    }

    #[test]
    fn test_ls_roundtrip_u8_uses_adaptive_path() {
        let grid = gradient(24, 16);
        let params = PredictorParams::least_squares();
        let pred = compute_residuals(&grid, &params).unwrap();
        assert!(pred.stats.adaptive > 0);
        assert!(pred.stats.fixed > 0, "borders always fall back");
        assert_eq!(pred.stats.total(), 24 * 16 * 3);

        let rec = reconstruct::<u8>(&pred.residuals, grid.shape(), &params).unwrap();
        assert_eq!(rec.grid, grid);
        assert_eq!(rec.stats, pred.stats);
    }

    #[test]
    fn test_ls_roundtrip_i16_unclamped() {
        let data: Vec<i16> = noise(9, 11, 3, 99)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (v as i16 - 128) * if i % 2 == 0 { 2 } else { -1 })
            .collect();
        let grid = PixelGrid::new(9, 11, 3, data).unwrap();
        for params in [PredictorParams::med(), PredictorParams::least_squares()] {
            let pred = compute_residuals(&grid, &params).unwrap();
            let rec = reconstruct::<i16>(&pred.residuals, grid.shape(), &params).unwrap();
            assert_eq!(rec.grid, grid);
        }
    }

    #[test]
    fn test_ls_small_window_falls_back() {
        // A 1x1 window never collects order + 2 samples.
        let grid = gradient(8, 8);
        let params = PredictorParams::least_squares().with_window(1, 1);
        let pred = compute_residuals(&grid, &params).unwrap();
        assert_eq!(pred.stats.adaptive, 0);
    }

    #[test]
    fn test_ls_exact_on_planar_ramp() {
        let data: Vec<u8> = (0..16)
            .flat_map(|y| (0..16).map(move |x| (3 * x + 5 * y) as u8))
            .collect();
        let grid = PixelGrid::new(16, 16, 1, data).unwrap();
        let at = |x: usize, y: usize| y * 16 + x;

        let ls = compute_residuals(&grid, &PredictorParams::least_squares()).unwrap();
        let med = compute_residuals(&grid, &PredictorParams::med()).unwrap();
        assert!(ls.stats.adaptive > 0);
        // Far enough from the edges for a full window and all four neighbours.
        for y in 5..16 {
            for x in 5..15 {
                assert_eq!(ls.residuals[at(x, y)], 0, "LS at ({x}, {y})");
                assert_eq!(med.residuals[at(x, y)], 3, "MED at ({x}, {y})");
            }
        }
        let nonzero = |r: &[i16]| r.iter().filter(|&&v| v != 0).count();
        assert!(nonzero(&ls.residuals) < nonzero(&med.residuals));
    }

    #[test]
    fn test_ls_needs_order_plus_two_samples() {
        // One row, left neighbour only: a window of width w sees at most
        // min(w, x - 1) usable samples at column x.
        let data: Vec<u8> = (0..6).map(|x| 10 + 3 * x).collect();
        let grid = PixelGrid::new(6, 1, 1, data).unwrap();
        let params = PredictorParams::least_squares().with_order(1);

        // Width 2: N + 1 samples at best, never enough.
        let pred = compute_residuals(&grid, &params.with_window(2, 0)).unwrap();
        assert_eq!(pred.stats.adaptive, 0);

        // Width 3: exactly N + 2 samples at columns 4 and 5.
        let pred = compute_residuals(&grid, &params.with_window(3, 0)).unwrap();
        assert_eq!(pred.stats.adaptive, 2);
        assert_eq!(pred.stats.fixed, 4);
        let rec = reconstruct::<u8>(&pred.residuals, grid.shape(), &params.with_window(3, 0)).unwrap();
        assert_eq!(rec.grid, grid);
    }

    #[test]
    fn test_reconstruct_rejects_wrong_length() {
        let err = reconstruct::<u8>(&[0; 5], Shape::new(2, 2, 1), &PredictorParams::med());
        assert!(matches!(
            err,
            Err(Error::LengthMismatch {
                expected: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_invalid_params() {
        let grid = gradient(2, 2);
        for params in [
            PredictorParams::least_squares().with_order(0),
            PredictorParams::least_squares().with_order(5),
            PredictorParams::least_squares().with_ridge(f64::NAN),
        ] {
            assert!(matches!(
                compute_residuals(&grid, &params),
                Err(Error::InvalidParams(_))
            ));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_predictor_roundtrip_u8(
            w in 1usize..9,
            h in 1usize..9,
            rgb in any::<bool>(),
            order in 1usize..=4,
            ls in any::<bool>(),
            seed in any::<u32>(),
        ) {
            let c = if rgb { 3 } else { 1 };
            let grid = PixelGrid::new(w, h, c, noise(w, h, c, seed)).unwrap();
            let params = PredictorParams {
                kind: if ls { PredictorKind::LeastSquares } else { PredictorKind::Med },
                order,
                ..PredictorParams::default()
            };
            let pred = compute_residuals(&grid, &params).unwrap();
            let rec = reconstruct::<u8>(&pred.residuals, grid.shape(), &params).unwrap();
            prop_assert_eq!(rec.grid, grid);
        }

        #[test]
        fn prop_predictor_roundtrip_i16(
            data in prop::collection::vec(-512i16..512, 3 * 6 * 5),
            ls in any::<bool>(),
        ) {
            let grid = PixelGrid::new(6, 5, 3, data).unwrap();
            let params = if ls { PredictorParams::least_squares() } else { PredictorParams::med() };
            let pred = compute_residuals(&grid, &params).unwrap();
            let rec = reconstruct::<i16>(&pred.residuals, grid.shape(), &params).unwrap();
            prop_assert_eq!(rec.grid, grid);
        }
    }
}
