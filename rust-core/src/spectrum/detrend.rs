//! Trend removal along the last (time) axis

use crate::options::Detrend;
use ndarray::{Array, ArrayViewMut1, Axis, Dimension};

/// Remove the mean or the least-squares line from a single series
pub fn detrend_lane(mut x: ArrayViewMut1<f64>, kind: Detrend) {
    let n = x.len();
    if n == 0 {
        return;
    }
    let mean = x.sum() / n as f64;

    match kind {
        Detrend::Constant => x.mapv_inplace(|v| v - mean),
        Detrend::Linear => {
            if n == 1 {
                x.fill(0.0);
                return;
            }
            let t_mean = (n as f64 - 1.0) / 2.0;
            let mut cov = 0.0;
            let mut var = 0.0;
            for (i, &v) in x.iter().enumerate() {
                let dt = i as f64 - t_mean;
                cov += dt * (v - mean);
                var += dt * dt;
            }
            let slope = cov / var;
            for (i, v) in x.iter_mut().enumerate() {
                *v -= mean + slope * (i as f64 - t_mean);
            }
        }
    }
}

/// Detrend every series of `x` along its last axis, in place
pub fn detrend<D: Dimension>(x: &mut Array<f64, D>, kind: Detrend) {
    let last = Axis(x.ndim() - 1);
    for lane in x.lanes_mut(last) {
        detrend_lane(lane, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_constant_removes_mean() {
        let mut x = array![[1.0, 2.0, 3.0, 6.0], [5.0, 5.0, 5.0, 5.0]];
        detrend(&mut x, Detrend::Constant);
        for row in x.outer_iter() {
            assert!(row.sum().abs() < 1e-12);
        }
        assert!((x[[0, 3]] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_removes_ramp() {
        let mut x = Array2::from_shape_fn((3, 50), |(c, i)| 2.0 + c as f64 * 0.5 * i as f64);
        detrend(&mut x, Detrend::Linear);
        assert!(x.iter().all(|v| v.abs() < 1e-10));
    }

    #[test]
    fn test_linear_keeps_residual() {
        // Ramp plus alternating term: only the alternating term survives
        let n = 64;
        let mut x = Array2::from_shape_fn((1, n), |(_, i)| {
            0.1 * i as f64 + if i % 2 == 0 { 1.0 } else { -1.0 }
        });
        detrend(&mut x, Detrend::Linear);
        let energy: f64 = x.iter().map(|v| v * v).sum();
        assert!((energy - n as f64).abs() < 0.1);
    }
}
