//! Power (or energy) within a frequency band and its peak frequency
//!
//! Integration uses the mid-point rectangle rule over the bins nearest the
//! band edges, both edges inclusive.

use super::analysis::{frequency, FrequencyConfig};
use crate::datatype::{Signal, SpectralResult};
use crate::error::{Result, SpectralError};
use crate::options::{Detrend, Output, Scaling, Sides};
use ndarray::{Array1, ArrayView1};
use std::collections::BTreeMap;

/// Data accepted by [`band_power`]
#[derive(Debug, Clone, Copy)]
pub enum BandPowerInput<'a> {
    /// Time series, spectralized first with [`BandPowerConfig`]
    Signal(&'a Signal),
    /// Precomputed spectral density
    Spectrum(&'a SpectralResult),
}

impl<'a> From<&'a Signal> for BandPowerInput<'a> {
    fn from(signal: &'a Signal) -> Self {
        BandPowerInput::Signal(signal)
    }
}

impl<'a> From<&'a SpectralResult> for BandPowerInput<'a> {
    fn from(result: &'a SpectralResult) -> Self {
        BandPowerInput::Spectrum(result)
    }
}

/// How a time series is spectralized before integration
#[derive(Debug, Clone, PartialEq)]
pub struct BandPowerConfig {
    /// Power or energy
    pub scaling: Scaling,

    /// FFT length in samples (crop or zero-pad)
    pub n_fft: Option<usize>,

    /// `None` picks linear detrending for power and none for energy
    pub detrend: Option<Detrend>,
}

impl Default for BandPowerConfig {
    fn default() -> Self {
        Self {
            scaling: Scaling::Power,
            n_fft: None,
            detrend: None,
        }
    }
}

impl BandPowerConfig {
    fn frequency_config(&self) -> FrequencyConfig {
        let detrend = self.detrend.or(match self.scaling {
            Scaling::Power => Some(Detrend::Linear),
            _ => None,
        });
        FrequencyConfig {
            output: Output::SpectralDensity,
            scaling: self.scaling,
            sides: Sides::One,
            n_fft: self.n_fft,
            detrend,
            ..FrequencyConfig::default()
        }
    }
}

/// Per-channel band power and peak frequency
#[derive(Debug, Clone, PartialEq)]
pub struct BandPower {
    pub channels: Vec<String>,
    pub power: Array1<f64>,
    pub peak_freq: Array1<f64>,
}

impl BandPower {
    /// Same values keyed by channel label
    pub fn to_maps(&self) -> (BTreeMap<String, f64>, BTreeMap<String, f64>) {
        let power = self
            .channels
            .iter()
            .cloned()
            .zip(self.power.iter().copied())
            .collect();
        let peak = self
            .channels
            .iter()
            .cloned()
            .zip(self.peak_freq.iter().copied())
            .collect();
        (power, peak)
    }
}

fn nearest_bin(freqs: ArrayView1<f64>, target: f64) -> usize {
    freqs
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - target).abs().total_cmp(&(b.1 - target).abs()))
        .map_or(0, |(i, _)| i)
}

/// Inclusive bin range selected by `band`
pub fn band_indices(freqs: ArrayView1<f64>, band: (Option<f64>, Option<f64>)) -> Result<(usize, usize)> {
    if freqs.len() < 2 {
        return Err(SpectralError::invalid("freq", "need at least two frequency bins"));
    }
    let low = band.0.map_or(0, |f| nearest_bin(freqs, f));
    let high = band.1.map_or(freqs.len() - 1, |f| nearest_bin(freqs, f));
    if low > high {
        return Err(SpectralError::EmptyBand(band.0, band.1));
    }
    Ok((low, high))
}

/// Integrate power (or energy) over a frequency band
///
/// # Arguments
/// * `data` - Signal or spectral density; only the first trial is used
/// * `band` - `(f_low, f_high)` in Hz; `None` leaves that side unbounded
/// * `config` - Spectralization options, ignored for spectral input
///
/// # Returns
/// Power per channel (density summed over the band times the frequency
/// resolution) and the frequency of the largest bin within the band.
pub fn band_power<'a>(
    data: impl Into<BandPowerInput<'a>>,
    band: (Option<f64>, Option<f64>),
    config: &BandPowerConfig,
) -> Result<BandPower> {
    let computed;
    let spectrum = match data.into() {
        BandPowerInput::Spectrum(result) => result,
        BandPowerInput::Signal(signal) => {
            computed = frequency(signal, &config.frequency_config())?;
            &computed
        }
    };

    let sxx = spectrum.data.first().ok_or(SpectralError::EmptySignal)?;
    let density = sxx
        .as_density()
        .ok_or_else(|| SpectralError::NotADensity(sxx.kind()))?;
    let freqs = spectrum.freq[0].view();
    let (low, high) = band_indices(freqs, band)?;
    let f_res = freqs[1] - freqs[0];

    let in_band = freqs.slice(ndarray::s![low..=high]);
    let mut power = Array1::zeros(density.nrows());
    let mut peak_freq = Array1::zeros(density.nrows());
    for (i, row) in density.outer_iter().enumerate() {
        let values = row.slice(ndarray::s![low..=high]);
        power[i] = values.sum() * f_res;
        let (idx_peak, _) = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .ok_or(SpectralError::EmptyBand(band.0, band.1))?;
        peak_freq[i] = in_band[idx_peak];
    }

    Ok(BandPower {
        channels: spectrum.chan[0].clone(),
        power,
        peak_freq,
    })
}
