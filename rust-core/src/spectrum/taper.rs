//! Taper (window) construction for spectral analysis
//!
//! Tapers are returned as a `[n_tapers × n_samples]` matrix, normalized for
//! the requested scaling so that the spectral core can apply its power or
//! energy constant without further window correction.

use super::dpss::{dpss_windows, taper_count};
use crate::error::{Result, SpectralError};
use crate::options::{Scaling, TaperKind};
use ndarray::{Array1, Array2, Axis};
use std::f64::consts::PI;

/// Which taper to build and, for DPSS, its bandwidth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaperSpec {
    pub kind: TaperKind,

    /// Half bandwidth in Hz (DPSS only). Smoothing spans ±halfbandwidth.
    pub halfbandwidth: f64,

    /// Normalized half bandwidth (DPSS only). Takes precedence over
    /// `halfbandwidth` when set.
    pub nw: Option<f64>,
}

impl Default for TaperSpec {
    fn default() -> Self {
        Self {
            kind: TaperKind::Boxcar,
            halfbandwidth: 3.0,
            nw: None,
        }
    }
}

impl TaperSpec {
    pub fn new(kind: TaperKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn dpss(halfbandwidth: f64) -> Self {
        Self {
            kind: TaperKind::Dpss,
            halfbandwidth,
            nw: None,
        }
    }

    /// NW for a segment of `n_samples` at `s_freq`
    pub fn resolve_nw(&self, n_samples: usize, s_freq: f64) -> f64 {
        self.nw
            .unwrap_or(self.halfbandwidth * n_samples as f64 / s_freq)
    }
}

/// Generate single-window coefficients
///
/// # Arguments
/// * `kind` - Boxcar or Hann (DPSS is a bank, see [`dpss_windows`])
/// * `length` - Number of samples (N)
///
/// # Returns
/// Window coefficients w[n] for n = 0..N-1
pub fn generate_window(kind: TaperKind, length: usize) -> Vec<f64> {
    let n = length as f64;

    match kind {
        TaperKind::Hann if length == 1 => vec![1.0],
        TaperKind::Hann => {
            // Periodic Hann: w[n] = 0.5 - 0.5*cos(2πn/N)
            (0..length)
                .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
                .collect()
        }
        TaperKind::Boxcar | TaperKind::Dpss => vec![1.0; length],
    }
}

/// Build the taper bank for a segment
///
/// # Arguments
/// * `spec` - Taper kind and DPSS bandwidth
/// * `n_samples` - Segment length
/// * `s_freq` - Sampling frequency in Hz
/// * `scaling` - Active scaling convention
pub fn build_tapers(
    spec: &TaperSpec,
    n_samples: usize,
    s_freq: f64,
    scaling: Scaling,
) -> Result<Array2<f64>> {
    if n_samples == 0 {
        return Err(SpectralError::invalid("n_samples", "cannot taper an empty segment"));
    }

    match spec.kind {
        TaperKind::Dpss => {
            let nw = spec.resolve_nw(n_samples, s_freq);
            let mut tapers = dpss_windows(n_samples, nw, taper_count(nw))?;
            if scaling == Scaling::Chronux {
                tapers *= s_freq.sqrt();
            }
            Ok(tapers)
        }
        kind => {
            let mut window = Array1::from(generate_window(kind, n_samples));
            match scaling {
                Scaling::Energy => {
                    let rms = window.mapv(|w| w * w).mean().unwrap_or(0.0).sqrt();
                    window /= rms * (n_samples as f64).sqrt();
                }
                Scaling::Chronux => {}
                Scaling::Power | Scaling::Fieldtrip => {
                    let norm = window.dot(&window).sqrt();
                    window /= norm;
                }
            }
            Ok(window.insert_axis(Axis(0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_is_periodic() {
        let hann = generate_window(TaperKind::Hann, 8);
        assert_eq!(hann.len(), 8);
        assert_eq!(hann[0], 0.0);
        // Peak sits at N/2, and the last sample is not zero
        assert!((hann[4] - 1.0).abs() < 1e-12);
        assert!(hann[7] > 0.1);
        assert!((hann[1] - hann[7]).abs() < 1e-12);
    }

    #[test]
    fn test_single_taper_unit_norm() {
        for kind in [TaperKind::Boxcar, TaperKind::Hann] {
            for scaling in [Scaling::Power, Scaling::Energy, Scaling::Fieldtrip] {
                let tapers = build_tapers(&TaperSpec::new(kind), 100, 50.0, scaling).unwrap();
                assert_eq!(tapers.shape(), &[1, 100]);
                let energy: f64 = tapers.iter().map(|w| w * w).sum();
                assert!((energy - 1.0).abs() < 1e-12, "{kind} {scaling}: {energy}");
            }
        }
    }

    #[test]
    fn test_chronux_leaves_window_raw() {
        let tapers = build_tapers(&TaperSpec::new(TaperKind::Boxcar), 16, 8.0, Scaling::Chronux).unwrap();
        assert!(tapers.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_dpss_taper_count() {
        // halfbandwidth 2 Hz over 2 s gives NW = 4, so 7 tapers
        let spec = TaperSpec::dpss(2.0);
        let tapers = build_tapers(&spec, 512, 256.0, Scaling::Power).unwrap();
        assert_eq!(tapers.nrows(), 2 * 4 - 1);
        assert_eq!(tapers.ncols(), 512);
    }

    #[test]
    fn test_nw_takes_precedence() {
        let spec = TaperSpec {
            kind: TaperKind::Dpss,
            halfbandwidth: 10.0,
            nw: Some(2.0),
        };
        let tapers = build_tapers(&spec, 256, 256.0, Scaling::Power).unwrap();
        assert_eq!(tapers.nrows(), 3);
    }

    #[test]
    fn test_dpss_chronux_scaling() {
        let spec = TaperSpec {
            kind: TaperKind::Dpss,
            halfbandwidth: 0.0,
            nw: Some(2.0),
        };
        let plain = build_tapers(&spec, 128, 100.0, Scaling::Power).unwrap();
        let chronux = build_tapers(&spec, 128, 100.0, Scaling::Chronux).unwrap();
        for (p, c) in plain.iter().zip(chronux.iter()) {
            assert!((p * 10.0 - c).abs() < 1e-10);
        }
    }
}
