//! Discrete prolate spheroidal sequences (Slepian tapers)
//!
//! The tapers are the leading eigenvectors of the symmetric tridiagonal
//! matrix that commutes with the time-bandwidth concentration operator:
//!
//! ```text
//! diag[n]    = ((N - 1 - 2n) / 2)² · cos(2πW)
//! offdiag[n] = n (N - n) / 2,          W = NW / N
//! ```
//!
//! Eigenvalues are located by Sturm-sequence bisection and eigenvectors by
//! inverse iteration with a pivoted tridiagonal solver.

use crate::error::{Result, SpectralError};
use ndarray::{Array2, ArrayView1};
use std::f64::consts::PI;

const BISECTION_STEPS: usize = 200;
const INVERSE_ITERATIONS: usize = 4;

/// Number of tapers for a normalized half bandwidth: 2·NW − 1 (at least one)
pub fn taper_count(nw: f64) -> usize {
    let k = 2 * nw.round() as i64 - 1;
    k.max(1) as usize
}

/// Compute `k` DPSS tapers of length `n`, each with unit L2 norm
///
/// Rows are ordered by decreasing spectral concentration. Symmetric tapers
/// have a positive sum; antisymmetric tapers start with a positive lobe.
pub fn dpss_windows(n: usize, nw: f64, k: usize) -> Result<Array2<f64>> {
    if n == 0 {
        return Err(SpectralError::invalid("n_samples", "DPSS length must be positive"));
    }
    if !(nw.is_finite() && nw > 0.0) {
        return Err(SpectralError::invalid("NW", format!("{nw} must be positive")));
    }
    if k == 0 || k > n {
        return Err(SpectralError::invalid(
            "NW",
            format!("{k} tapers requested for a segment of {n} samples"),
        ));
    }

    let w = nw / n as f64;
    let cos_w = (2.0 * PI * w).cos();
    let diag: Vec<f64> = (0..n)
        .map(|i| {
            let half = (n as f64 - 1.0 - 2.0 * i as f64) / 2.0;
            half * half * cos_w
        })
        .collect();
    let offdiag: Vec<f64> = (1..n)
        .map(|i| i as f64 * (n - i) as f64 / 2.0)
        .collect();

    let matrix = Tridiagonal { diag, offdiag };
    let mut tapers = Array2::zeros((k, n));
    let mut found: Vec<Vec<f64>> = Vec::with_capacity(k);

    for order in 0..k {
        // Largest eigenvalue first
        let lambda = matrix.eigenvalue(n - 1 - order);
        let mut v = matrix.eigenvector(lambda, &found);
        fix_sign(&mut v, order);
        tapers.row_mut(order).assign(&ArrayView1::from(v.as_slice()));
        found.push(v);
    }

    log::debug!("DPSS: N={n}, NW={nw:.3}, {k} tapers");
    Ok(tapers)
}

/// Symmetric tridiagonal matrix
struct Tridiagonal {
    diag: Vec<f64>,
    offdiag: Vec<f64>,
}

impl Tridiagonal {
    fn len(&self) -> usize {
        self.diag.len()
    }

    /// Gershgorin interval containing the whole spectrum
    fn bounds(&self) -> (f64, f64) {
        let n = self.len();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for i in 0..n {
            let left = if i > 0 { self.offdiag[i - 1].abs() } else { 0.0 };
            let right = if i + 1 < n { self.offdiag[i].abs() } else { 0.0 };
            lo = lo.min(self.diag[i] - left - right);
            hi = hi.max(self.diag[i] + left + right);
        }
        (lo, hi)
    }

    /// Number of eigenvalues strictly below `x` (Sturm count)
    fn count_below(&self, x: f64, tiny: f64) -> usize {
        let mut count = 0;
        let mut q = self.diag[0] - x;
        for i in 0..self.len() {
            if i > 0 {
                let e = self.offdiag[i - 1];
                q = self.diag[i] - x - e * e / q;
            }
            if q == 0.0 {
                q = -tiny;
            }
            if q < 0.0 {
                count += 1;
            }
        }
        count
    }

    /// `index`-th smallest eigenvalue (0-based)
    fn eigenvalue(&self, index: usize) -> f64 {
        let (mut lo, mut hi) = self.bounds();
        let scale = lo.abs().max(hi.abs()).max(1.0);
        let tiny = f64::EPSILON * scale;

        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if self.count_below(mid, tiny) > index {
                hi = mid;
            } else {
                lo = mid;
            }
            if hi - lo <= 2.0 * f64::EPSILON * scale {
                break;
            }
        }
        0.5 * (lo + hi)
    }

    /// Unit eigenvector for `lambda`, orthogonal to `previous`
    fn eigenvector(&self, lambda: f64, previous: &[Vec<f64>]) -> Vec<f64> {
        let n = self.len();
        if n == 1 {
            return vec![1.0];
        }

        let shifted: Vec<f64> = self.diag.iter().map(|d| d - lambda).collect();
        // Mixed symmetric/antisymmetric start so both parities are reachable
        let mut v: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 / n as f64).collect();
        orthonormalize(&mut v, previous);

        for _ in 0..INVERSE_ITERATIONS {
            solve_tridiagonal(&self.offdiag, &shifted, &self.offdiag, &mut v);
            orthonormalize(&mut v, previous);
        }
        v
    }
}

/// Remove the components along `basis` and scale to unit norm
fn orthonormalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let proj: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
        for (x, y) in v.iter_mut().zip(b) {
            *x -= proj * y;
        }
    }
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Solve a tridiagonal system in place with partial pivoting
///
/// `sub` and `sup` have length n-1, `diag` has length n. On return `rhs`
/// holds the solution. Zero pivots are replaced by a tiny value, which is
/// what inverse iteration wants near an eigenvalue.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &mut [f64]) {
    let n = diag.len();
    let mut d = diag.to_vec();
    let mut du = sup.to_vec();
    let mut du2 = vec![0.0; n.saturating_sub(2)];
    let dl = sub;

    let scale = diag
        .iter()
        .chain(sup)
        .fold(0.0_f64, |acc, x| acc.max(x.abs()))
        .max(1.0);
    let tiny = f64::EPSILON * scale;
    let guard = |x: f64| if x.abs() < tiny { tiny.copysign(if x == 0.0 { 1.0 } else { x }) } else { x };

    for i in 0..n - 1 {
        if d[i].abs() >= dl[i].abs() {
            d[i] = guard(d[i]);
            let fact = dl[i] / d[i];
            d[i + 1] -= fact * du[i];
            rhs[i + 1] -= fact * rhs[i];
        } else {
            // Swap rows i and i+1
            let fact = d[i] / dl[i];
            d[i] = dl[i];
            let temp = d[i + 1];
            d[i + 1] = du[i] - fact * temp;
            if i + 2 < n {
                du2[i] = du[i + 1];
                du[i + 1] = -fact * du[i + 1];
            }
            du[i] = temp;
            let (ri, rn) = (rhs[i], rhs[i + 1]);
            rhs[i] = rn;
            rhs[i + 1] = ri - fact * rn;
        }
    }

    d[n - 1] = guard(d[n - 1]);
    rhs[n - 1] /= d[n - 1];
    rhs[n - 2] = (rhs[n - 2] - du[n - 2] * rhs[n - 1]) / d[n - 2];
    for i in (0..n.saturating_sub(2)).rev() {
        rhs[i] = (rhs[i] - du[i] * rhs[i + 1] - du2[i] * rhs[i + 2]) / d[i];
    }
}

fn fix_sign(v: &mut [f64], order: usize) {
    let flip = if order % 2 == 0 {
        v.iter().sum::<f64>() < 0.0
    } else {
        let thresh = (1.0 / v.len() as f64).max(1e-7);
        v.iter()
            .find(|&&x| x * x > thresh)
            .map_or(false, |&x| x < 0.0)
    };
    if flip {
        v.iter_mut().for_each(|x| *x = -*x);
    }
}
