//! Spectral core: taper, transform and scale a block of time series
//!
//! Input blocks are `[channel × segment × time]`. A plain trial is a block
//! with a single segment; the Welch segmenter fills the middle axis.

use super::detrend::detrend;
use super::taper::{build_tapers, TaperSpec};
use crate::error::{Result, SpectralError};
use crate::options::{Detrend, Output, Scaling, Sides};
use ndarray::{Array1, Array3, Array4, ArrayView3, Axis};
use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};
use std::ops::Range;
use std::sync::Arc;

/// Parameters of one call to the spectral core
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    pub detrend: Option<Detrend>,
    pub taper: TaperSpec,
    pub output: Output,
    /// Forced to [`Sides::Two`] for complex output
    pub sides: Sides,
    pub scaling: Scaling,
    /// FFT length; crops or zero-pads the segment. Defaults to its length.
    pub n_fft: Option<usize>,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            detrend: Some(Detrend::Linear),
            taper: TaperSpec::default(),
            output: Output::SpectralDensity,
            sides: Sides::One,
            scaling: Scaling::Power,
            n_fft: None,
        }
    }
}

/// Raw output of the spectral core, before any reduction over segments
#[derive(Debug, Clone, PartialEq)]
pub enum CoreData {
    /// `[channel × segment × freq]`
    Density(Array3<f64>),
    /// `[1 × segment × freq]`
    CrossSpectrum(Array3<Complex64>),
    /// `[channel × segment × freq × taper]`
    Complex(Array4<Complex64>),
}

impl CoreData {
    /// Natural logarithm of every value
    pub fn ln(self) -> Self {
        match self {
            CoreData::Density(d) => CoreData::Density(d.mapv_into(f64::ln)),
            CoreData::CrossSpectrum(d) => CoreData::CrossSpectrum(d.mapv_into(|c| c.ln())),
            CoreData::Complex(d) => CoreData::Complex(d.mapv_into(|c| c.ln())),
        }
    }
}

/// Frequency axis and data returned by [`spectral_transform`]
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub freqs: Array1<f64>,
    pub data: CoreData,
}

/// FFT engine for tapered real segments
///
/// One-sided transforms use a real-to-complex plan, two-sided transforms a
/// full complex plan. Either way the output is in ascending frequency
/// order.
pub struct FftEngine {
    /// FFT size (number of samples after padding / cropping)
    n_fft: usize,

    sides: Sides,

    /// Real FFT processor (one-sided)
    r2c: Option<Arc<dyn RealToComplex<f64>>>,

    /// Complex FFT processor (two-sided)
    c2c: Option<Arc<dyn Fft<f64>>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable complex buffer
    spectrum_buffer: Vec<Complex64>,
}

impl FftEngine {
    pub fn new(n_fft: usize, sides: Sides) -> Self {
        let (r2c, c2c, spectrum_len) = match sides {
            Sides::One => {
                let mut planner = RealFftPlanner::<f64>::new();
                (Some(planner.plan_fft_forward(n_fft)), None, n_fft / 2 + 1)
            }
            Sides::Two => {
                let mut planner = FftPlanner::<f64>::new();
                (None, Some(planner.plan_fft_forward(n_fft)), n_fft)
            }
        };

        Self {
            n_fft,
            sides,
            r2c,
            c2c,
            input_buffer: vec![0.0; n_fft],
            spectrum_buffer: vec![Complex64::new(0.0, 0.0); spectrum_len],
        }
    }

    pub fn num_bins(&self) -> usize {
        self.spectrum_buffer.len()
    }

    /// Frequencies in Hz of each output bin
    pub fn frequency_axis(&self, s_freq: f64) -> Array1<f64> {
        let n = self.n_fft;
        let df = s_freq / n as f64;
        match self.sides {
            Sides::One => Array1::from_iter((0..self.num_bins()).map(|k| k as f64 * df)),
            Sides::Two => {
                // Ascending: -floor(n/2) .. ceil(n/2) - 1
                let first = -((n / 2) as i64);
                Array1::from_iter((0..n).map(|k| (first + k as i64) as f64 * df))
            }
        }
    }

    /// Transform one segment, zero-padded or cropped to the FFT size
    pub fn transform(&mut self, signal: &[f64]) -> Result<&[Complex64]> {
        let copy_len = signal.len().min(self.n_fft);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        if let Some(r2c) = &self.r2c {
            r2c.process(&mut self.input_buffer, &mut self.spectrum_buffer)?;
        } else if let Some(c2c) = &self.c2c {
            let n = self.n_fft;
            let mut buf: Vec<Complex64> = self
                .input_buffer
                .iter()
                .map(|&x| Complex64::new(x, 0.0))
                .collect();
            c2c.process(&mut buf);
            // fftshift: negative frequencies first
            let shift = n - n / 2;
            for (k, out) in self.spectrum_buffer.iter_mut().enumerate() {
                *out = buf[(k + shift) % n];
            }
        }

        Ok(&self.spectrum_buffer)
    }
}

/// Bins of a one-sided spectrum that pair with a negative frequency
pub fn doubled_bins(n_fft: usize) -> Range<usize> {
    let n_bins = n_fft / 2 + 1;
    if n_fft % 2 == 1 {
        1..n_bins
    } else {
        // Last point is the unpaired Nyquist bin
        1..n_bins.saturating_sub(1).max(1)
    }
}

/// Core spectral transform
///
/// # Arguments
/// * `x` - `[channel × segment × time]` block (not modified)
/// * `s_freq` - Sampling frequency in Hz
/// * `params` - Detrend, taper, output, sides, scaling, FFT length
///
/// # Returns
/// Frequency axis and the data described by [`CoreData`]. Spectral
/// densities and cross-spectra are averaged over tapers; the complex
/// output keeps the taper axis last.
pub fn spectral_transform(x: ArrayView3<f64>, s_freq: f64, params: &TransformParams) -> Result<Transform> {
    let (n_chan, n_seg, n_smp) = x.dim();
    if n_smp == 0 {
        return Err(SpectralError::invalid("n_samples", "segment has no samples"));
    }
    if params.output == Output::Csd && n_chan != 2 {
        return Err(SpectralError::CsdChannelCount(n_chan));
    }

    let sides = if params.output == Output::Complex && params.sides == Sides::One {
        log::info!("complex always returns both sides");
        Sides::Two
    } else {
        params.sides
    };
    let n_fft = params.n_fft.unwrap_or(n_smp);
    if n_fft == 0 {
        return Err(SpectralError::invalid("n_fft", "must be positive"));
    }

    let tapers = build_tapers(&params.taper, n_smp, s_freq, params.scaling)?;
    let n_tapers = tapers.nrows();

    let mut block = x.to_owned();
    if let Some(kind) = params.detrend {
        detrend(&mut block, kind);
    }

    let mut engine = FftEngine::new(n_fft, sides);
    let freqs = engine.frequency_axis(s_freq);
    let n_bins = engine.num_bins();

    let pre_scale = match params.scaling {
        Scaling::Chronux => 1.0 / s_freq,
        Scaling::Fieldtrip => (2.0 / n_smp as f64).sqrt(),
        Scaling::Power | Scaling::Energy => 1.0,
    };

    // [channel × segment × taper × freq]
    let mut spectra = Array4::<Complex64>::zeros((n_chan, n_seg, n_tapers, n_bins));
    let mut tapered = vec![0.0; n_smp];
    for c in 0..n_chan {
        for s in 0..n_seg {
            let series = block.slice(ndarray::s![c, s, ..]);
            for (k, taper) in tapers.outer_iter().enumerate() {
                for ((dst, &v), &w) in tapered.iter_mut().zip(series.iter()).zip(taper.iter()) {
                    *dst = v * w;
                }
                let spectrum = engine.transform(&tapered)?;
                let mut out = spectra.slice_mut(ndarray::s![c, s, k, ..]);
                for (o, &z) in out.iter_mut().zip(spectrum) {
                    *o = z * pre_scale;
                }
            }
        }
    }

    let scale = match params.scaling {
        Scaling::Power => 1.0 / s_freq,
        Scaling::Energy => 1.0 / n_smp as f64,
        Scaling::Fieldtrip | Scaling::Chronux => 1.0,
    };
    let one_sided_density = sides == Sides::One && params.scaling != Scaling::Chronux;
    let post_scale = if params.scaling == Scaling::Fieldtrip {
        // FieldTrip reports one side only
        scale / 2.0
    } else {
        scale
    };

    let data = match params.output {
        Output::Complex => {
            let amplitude = match params.scaling {
                Scaling::Power | Scaling::Energy => scale.sqrt(),
                Scaling::Fieldtrip | Scaling::Chronux => 1.0,
            };
            spectra.mapv_inplace(|z| z * amplitude);
            let moved = spectra.permuted_axes([0, 1, 3, 2]);
            CoreData::Complex(moved.as_standard_layout().into_owned())
        }
        Output::SpectralDensity => {
            let mut power = spectra.mapv(|z| z.norm_sqr());
            if one_sided_density {
                let bins = doubled_bins(n_fft);
                power
                    .slice_mut(ndarray::s![.., .., .., bins])
                    .mapv_inplace(|p| p * 2.0);
            }
            power *= post_scale;
            let mean = power
                .mean_axis(Axis(2))
                .ok_or_else(|| SpectralError::invalid("taper", "no taper was built"))?;
            CoreData::Density(mean)
        }
        Output::Csd => {
            let first = spectra.index_axis(Axis(0), 0);
            let second = spectra.index_axis(Axis(0), 1);
            // [segment × taper × freq]
            let mut cross = ndarray::Zip::from(&first)
                .and(&second)
                .map_collect(|a, b| a.conj() * b);
            if one_sided_density {
                let bins = doubled_bins(n_fft);
                cross
                    .slice_mut(ndarray::s![.., .., bins])
                    .mapv_inplace(|z| z * 2.0);
            }
            cross.mapv_inplace(|z| z * post_scale);
            let mean = cross
                .mean_axis(Axis(1))
                .ok_or_else(|| SpectralError::invalid("taper", "no taper was built"))?;
            CoreData::CrossSpectrum(mean.insert_axis(Axis(0)))
        }
    };

    Ok(Transform { freqs, data })
}
