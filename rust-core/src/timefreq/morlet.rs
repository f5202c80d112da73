//! Complex Morlet wavelets
//!
//! A Morlet wavelet is a complex sinusoid under a Gaussian envelope:
//!
//! ```text
//! w(t) = (exp(i·2π·f·t) − c) · exp(−t² / (2σ_t²)),   σ_t = 1 / σ_f
//! ```
//!
//! where `c = exp(−ratio²/2)` when a zero-mean wavelet is requested and 0
//! otherwise. `ratio = f / σ_f` fixes the number of cycles under the
//! envelope.

use crate::error::{Result, SpectralError};
use crate::options::Normalization;
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Ratio below which the uncorrected wavelet has a noticeable mean
const ZERO_MEAN_RATIO: f64 = 5.0;

/// Shape of a Morlet wavelet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorletParams {
    /// freq / sigma_f, ignored when `sigma_f` is set
    pub ratio: f64,

    /// Frequency-domain standard deviation in Hz
    pub sigma_f: Option<f64>,

    /// One-sided duration, in time-domain standard deviations
    pub dur_in_sd: f64,

    /// Total (two-sided) duration in seconds, overrides `dur_in_sd`
    pub dur_in_s: Option<f64>,

    pub normalization: Normalization,

    /// Subtract the DC offset (matters when `ratio < 5`)
    pub zero_mean: bool,
}

impl Default for MorletParams {
    fn default() -> Self {
        Self {
            ratio: 5.0,
            sigma_f: None,
            dur_in_sd: 4.0,
            dur_in_s: None,
            normalization: Normalization::Wonambi,
            zero_mean: false,
        }
    }
}

/// Sampled wavelet and the parameters it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct Wavelet {
    /// Centre frequency in Hz
    pub freq: f64,
    pub sigma_f: f64,
    pub sigma_t: f64,
    /// Total duration in seconds
    pub dur_in_s: f64,
    pub samples: Array1<Complex64>,
}

impl Wavelet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SpectralError::invalid(name, format!("{value} must be positive")))
    }
}

/// Build a Morlet wavelet centred on `freq`
///
/// # Arguments
/// * `freq` - Centre frequency in Hz
/// * `s_freq` - Sampling frequency in Hz
/// * `params` - Bandwidth, duration and normalization
///
/// The time vector is `k / s_freq` for `k` in `-h..=h`, so the wavelet has
/// odd length and its centre sample sits at t = 0.
///
/// Normalizations:
/// * `Wonambi` - amplitude 1 after convolution with a unit sine
/// * `Juniper` - amplitude depends on the sampling frequency
/// * `Area` - unit energy of the Gaussian envelope
/// * `Peak` - unit peak of the Gaussian envelope
pub fn morlet(freq: f64, s_freq: f64, params: &MorletParams) -> Result<Wavelet> {
    let freq = positive("freq", freq)?;
    let s_freq = positive("s_freq", s_freq)?;

    let (sigma_f, ratio) = match params.sigma_f {
        Some(sigma_f) => {
            let sigma_f = positive("sigma_f", sigma_f)?;
            (sigma_f, freq / sigma_f)
        }
        None => {
            let ratio = positive("ratio", params.ratio)?;
            (freq / ratio, ratio)
        }
    };
    let sigma_t = 1.0 / sigma_f;

    if ratio < ZERO_MEAN_RATIO && !params.zero_mean {
        log::info!("The wavelet won't have zero mean, set zero_mean=true to correct it");
    }

    let dur_in_s = match params.dur_in_s {
        Some(dur) => positive("dur_in_s", dur)?,
        None => sigma_t * positive("dur_in_sd", params.dur_in_sd)? * 2.0,
    };

    let half = (dur_in_s * s_freq / 2.0).floor() as i64;
    let offset = if params.zero_mean {
        (-0.5 * ratio * ratio).exp()
    } else {
        0.0
    };
    let scale = match params.normalization {
        Normalization::Wonambi => (PI / 2.0).sqrt() * sigma_t * s_freq,
        Normalization::Juniper => (2.0 * PI).sqrt() * sigma_t,
        Normalization::Area => (PI.sqrt() * sigma_t * s_freq).sqrt(),
        Normalization::Peak => 1.0,
    };

    let samples: Array1<Complex64> = (-half..=half)
        .map(|k| {
            let t = k as f64 / s_freq;
            let carrier = Complex64::from_polar(1.0, 2.0 * PI * freq * t) - offset;
            let envelope = (-t * t / (2.0 * sigma_t * sigma_t)).exp();
            carrier * (envelope / scale)
        })
        .collect();

    log::info!(
        "At freq {freq:9.3}Hz, sigma_f={sigma_f:9.3}Hz, sigma_t={sigma_t:9.3}s, total duration={dur_in_s:9.3}s"
    );
    if log::log_enabled!(log::Level::Debug) {
        let real_peak = samples.iter().map(|z| z.re).fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.mean().unwrap_or_default();
        let energy: f64 = samples.iter().map(|z| z.norm_sqr()).sum();
        log::debug!("    Real peak={real_peak:9.3}, Mean={mean:12.6}, Energy={energy:9.3}");
    }

    Ok(Wavelet {
        freq,
        sigma_f,
        sigma_t,
        dur_in_s,
        samples,
    })
}

/// One wavelet per frequency of interest
pub fn morlet_bank(foi: &[f64], s_freq: f64, params: &MorletParams) -> Result<Vec<Wavelet>> {
    if foi.is_empty() {
        return Err(SpectralError::EmptyFrequencies);
    }
    foi.iter().map(|&f| morlet(f, s_freq, params)).collect()
}
