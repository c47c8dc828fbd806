//! Dense Gauss-Jordan elimination for the least-squares predictor.
//!
//! Systems are tiny (at most 4x4), so everything happens in place on
//! row-major slices with no allocation.

/// Pivots smaller than this are treated as singular.
pub const SINGULAR_EPS: f64 = 1e-12;

/// Ridge term added to the normal-equation diagonal by default.
pub const DEFAULT_RIDGE: f64 = 1e-3;

/// Solve `(a + ridge * I) x = b` in place.
///
/// `a` is row-major `n x n` with `n = b.len()`. On success `b` holds `x`
/// and `true` is returned. Returns `false` when a column's best pivot is
/// below [`SINGULAR_EPS`]; both slices are then left in an unspecified
/// state.
pub fn gauss_jordan(a: &mut [f64], b: &mut [f64], ridge: f64) -> bool {
    let n = b.len();
    if n == 0 || a.len() != n * n {
        return false;
    }
    if ridge != 0.0 {
        for d in 0..n {
            a[d * n + d] += ridge;
        }
    }

    for k in 0..n {
        // Partial pivoting: largest magnitude at or below the diagonal.
        let mut piv = k;
        let mut best = a[k * n + k].abs();
        for i in (k + 1)..n {
            let v = a[i * n + k].abs();
            if v > best {
                best = v;
                piv = i;
            }
        }
        if best < SINGULAR_EPS {
            return false;
        }

        if piv != k {
            for j in 0..n {
                a.swap(k * n + j, piv * n + j);
            }
            b.swap(k, piv);
        }

        let inv = 1.0 / a[k * n + k];
        a[k * n + k] = 1.0;
        for j in 0..n {
            if j != k {
                a[k * n + j] *= inv;
            }
        }
        b[k] *= inv;

        for i in 0..n {
            if i == k {
                continue;
            }
            let f = a[i * n + k];
            if f == 0.0 {
                continue;
            }
            a[i * n + k] = 0.0;
            for j in 0..n {
                if j != k {
                    a[i * n + j] -= f * a[k * n + j];
                }
            }
            b[i] -= f * b[k];
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_solves_identity() {
        let mut a = [1.0, 0.0, 0.0, 1.0];
        let mut b = [3.0, -2.0];
        assert!(gauss_jordan(&mut a, &mut b, 0.0));
        assert_eq!(b, [3.0, -2.0]);
    }

    #[test]
    fn test_needs_pivoting() {
        // Zero on the first diagonal entry forces a row swap.
        let mut a = [0.0, 2.0, 1.0, 0.0, 3.0, 1.0, 4.0, 1.0, 0.0];
        let x = [1.0, 2.0, 3.0];
        let mut b = [
            0.0 * x[0] + 2.0 * x[1] + 1.0 * x[2],
            3.0 * x[1] + 1.0 * x[2],
            4.0 * x[0] + 1.0 * x[1],
        ];
        assert!(gauss_jordan(&mut a, &mut b, 0.0));
        for (got, want) in b.iter().zip(x) {
            assert!(close(*got, want), "{got} vs {want}");
        }
    }

    #[test]
    fn test_singular_fails_without_ridge() {
        let mut a = [1.0, 2.0, 2.0, 4.0];
        let mut b = [1.0, 2.0];
        assert!(!gauss_jordan(&mut a, &mut b, 0.0));
    }

    #[test]
    fn test_ridge_regularizes_singular_system() {
        let mut a = [1.0, 2.0, 2.0, 4.0];
        let mut b = [1.0, 2.0];
        assert!(gauss_jordan(&mut a, &mut b, DEFAULT_RIDGE));
        assert!(b.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_system_fails() {
        assert!(!gauss_jordan(&mut [], &mut [], 0.0));
    }
}
