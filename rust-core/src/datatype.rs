//! Signal container and result value types
//!
//! A [`Signal`] is a list of trials sharing one sampling frequency. Every
//! trial is a `[channel × time]` block with its own channel labels and time
//! axis. Results copy the metadata they need and never refer back to the
//! input.

use crate::error::{Result, SpectralError};
use ndarray::{Array1, Array2, Array3, Array4, ArrayView2};
use num_complex::Complex64;
use std::collections::BTreeMap;

/// Default axis order of a trial block
pub const DEFAULT_AXES: [&str; 2] = ["chan", "time"];

/// One trial: a `[channel × time]` block with its labels and time axis
#[derive(Debug, Clone)]
pub struct Trial {
    pub data: Array2<f64>,
    pub chan: Vec<String>,
    /// Time of every sample, in seconds
    pub time: Array1<f64>,
}

impl Trial {
    /// Build a trial whose time axis starts at `start_time`
    pub fn new(data: Array2<f64>, chan: Vec<String>, s_freq: f64, start_time: f64) -> Result<Self> {
        if chan.len() != data.nrows() {
            return Err(SpectralError::invalid(
                "chan",
                format!("{} labels for {} channels", chan.len(), data.nrows()),
            ));
        }
        let time = Array1::from_iter((0..data.ncols()).map(|i| start_time + i as f64 / s_freq));
        Ok(Self { data, chan, time })
    }

    pub fn n_chan(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }
}

/// Multi-trial multichannel signal
#[derive(Debug, Clone)]
pub struct Signal {
    pub trials: Vec<Trial>,
    /// Sampling frequency in Hz
    pub s_freq: f64,
    pub start_time: f64,
    /// Declared axis order of each trial block
    pub axes: Vec<String>,
    /// Free-form metadata, copied verbatim into results
    pub attr: BTreeMap<String, String>,
}

impl Signal {
    /// Single-trial signal with channels labelled `chan0`, `chan1`, ...
    pub fn from_array(data: Array2<f64>, s_freq: f64) -> Result<Self> {
        let chan = (0..data.nrows()).map(|i| format!("chan{i}")).collect();
        Self::new(vec![Trial::new(data, chan, s_freq, 0.0)?], s_freq, 0.0)
    }

    pub fn new(trials: Vec<Trial>, s_freq: f64, start_time: f64) -> Result<Self> {
        if !(s_freq.is_finite() && s_freq > 0.0) {
            return Err(SpectralError::invalid("s_freq", format!("{s_freq} is not a positive rate")));
        }
        Ok(Self {
            trials,
            s_freq,
            start_time,
            axes: DEFAULT_AXES.iter().map(|s| s.to_string()).collect(),
            attr: BTreeMap::new(),
        })
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attr.insert(key.into(), value.into());
        self
    }

    pub fn n_trials(&self) -> usize {
        self.trials.len()
    }

    /// Data of trial `i`, if it exists
    pub fn trial(&self, i: usize) -> Option<ArrayView2<'_, f64>> {
        self.trials.get(i).map(|t| t.data.view())
    }

    /// Fail unless `time` is the final axis
    pub fn check_time_last(&self) -> Result<()> {
        match self.axes.iter().position(|a| a == "time") {
            None => Err(SpectralError::MissingTimeAxis(self.axes.clone())),
            Some(i) if i + 1 != self.axes.len() => {
                Err(SpectralError::TimeAxisNotLast(self.axes.clone()))
            }
            Some(_) => Ok(()),
        }
    }
}

/// Spectral data of one trial
#[derive(Debug, Clone, PartialEq)]
pub enum SpectralData {
    /// `[channel × freq]` power/energy spectral density
    Density(Array2<f64>),
    /// `[1 × freq]` cross-spectral density of the two input channels
    CrossSpectrum(Array2<Complex64>),
    /// `[channel × freq × taper]` complex spectrum
    Complex(Array3<Complex64>),
}

impl SpectralData {
    pub fn kind(&self) -> &'static str {
        match self {
            SpectralData::Density(_) => "spectral density",
            SpectralData::CrossSpectrum(_) => "cross-spectral density",
            SpectralData::Complex(_) => "complex spectrum",
        }
    }

    pub fn as_density(&self) -> Option<&Array2<f64>> {
        match self {
            SpectralData::Density(d) => Some(d),
            _ => None,
        }
    }
}

/// Output of [`crate::frequency`]
#[derive(Debug, Clone)]
pub struct SpectralResult {
    pub s_freq: f64,
    pub start_time: f64,
    pub attr: BTreeMap<String, String>,
    /// Channel labels per trial
    pub chan: Vec<Vec<String>>,
    /// Frequency axis per trial
    pub freq: Vec<Array1<f64>>,
    /// Taper index axis per trial (complex output only)
    pub taper: Option<Vec<Array1<usize>>>,
    pub data: Vec<SpectralData>,
}

impl SpectralResult {
    pub fn n_trials(&self) -> usize {
        self.data.len()
    }

    /// Single-trial result wrapping a precomputed `[channel × freq]` density
    pub fn from_density(freq: Array1<f64>, density: Array2<f64>, chan: Vec<String>, s_freq: f64) -> Result<Self> {
        if density.ncols() != freq.len() {
            return Err(SpectralError::invalid(
                "freq",
                format!("{} frequencies for {} density bins", freq.len(), density.ncols()),
            ));
        }
        if density.nrows() != chan.len() {
            return Err(SpectralError::invalid(
                "chan",
                format!("{} labels for {} channels", chan.len(), density.nrows()),
            ));
        }
        Ok(Self {
            s_freq,
            start_time: 0.0,
            attr: BTreeMap::new(),
            chan: vec![chan],
            freq: vec![freq],
            taper: None,
            data: vec![SpectralData::Density(density)],
        })
    }

    /// Frequency resolution of trial `i`
    pub fn resolution(&self, i: usize) -> Option<f64> {
        let f = self.freq.get(i)?;
        if f.len() < 2 {
            None
        } else {
            Some(f[1] - f[0])
        }
    }
}

/// Time-frequency data of one trial
#[derive(Debug, Clone, PartialEq)]
pub enum TimeFrequencyData {
    /// `[channel × time × freq]` wavelet coefficients
    Complex(Array3<Complex64>),
    /// `[channel × time × freq]` spectrogram
    Density(Array3<f64>),
    /// `[channel × time × freq × taper]` short-time Fourier transform
    Stft(Array4<Complex64>),
}

/// Output of [`crate::timefrequency`]
#[derive(Debug, Clone)]
pub struct TimeFrequencyResult {
    pub s_freq: f64,
    pub start_time: f64,
    pub attr: BTreeMap<String, String>,
    pub chan: Vec<Vec<String>>,
    pub time: Vec<Array1<f64>>,
    pub freq: Vec<Array1<f64>>,
    /// Taper index axis per trial (stft only)
    pub taper: Option<Vec<Array1<usize>>>,
    pub data: Vec<TimeFrequencyData>,
}
