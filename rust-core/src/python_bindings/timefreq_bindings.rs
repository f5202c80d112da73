//! Python bindings for time-frequency analysis

use num_complex::Complex64;
use numpy::{IntoPyArray, PyArray1, PyArray3, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use super::signal_from_numpy;
use crate::datatype::TimeFrequencyData;
use crate::timefreq::{MorletConfig, MorletParams, TimeFrequencyMethod};

fn morlet_params(
    ratio: f64,
    sigma_f: Option<f64>,
    dur_in_sd: f64,
    dur_in_s: Option<f64>,
    normalization: &str,
    zero_mean: bool,
) -> PyResult<MorletParams> {
    Ok(MorletParams {
        ratio,
        sigma_f,
        dur_in_sd,
        dur_in_s,
        normalization: normalization.parse()?,
        zero_mean,
    })
}

/// Complex Morlet wavelet transform
///
/// Args:
///     data: 2D array, channels × time
///     s_freq: Sampling frequency in Hz
///     foi: Frequencies of interest in Hz
///     ratio: freq / sigma_f
///     sigma_f: Frequency-domain standard deviation (overrides ratio)
///     dur_in_sd: One-sided wavelet duration in standard deviations
///     dur_in_s: Total wavelet duration in s (overrides dur_in_sd)
///     normalization: 'area', 'peak', 'wonambi' or 'juniper'
///     zero_mean: Remove the DC offset of the wavelet
///     n_workers: Threads for the convolutions (default: all cores)
///
/// Returns:
///     Tuple of (time, frequencies, coefficients channels × time × freq)
#[pyfunction]
#[pyo3(signature = (
    data, s_freq, foi, ratio=5.0, sigma_f=None, dur_in_sd=4.0, dur_in_s=None,
    normalization="area", zero_mean=false, n_workers=None
))]
#[allow(clippy::too_many_arguments)]
pub fn timefrequency_morlet<'py>(
    py: Python<'py>,
    data: PyReadonlyArray2<f64>,
    s_freq: f64,
    foi: Vec<f64>,
    ratio: f64,
    sigma_f: Option<f64>,
    dur_in_sd: f64,
    dur_in_s: Option<f64>,
    normalization: &str,
    zero_mean: bool,
    n_workers: Option<usize>,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>, &'py PyArray3<Complex64>)> {
    let method = TimeFrequencyMethod::Morlet(MorletConfig {
        foi,
        params: morlet_params(ratio, sigma_f, dur_in_sd, dur_in_s, normalization, zero_mean)?,
        n_workers,
    });
    let signal = signal_from_numpy(data, s_freq, None)?;

    let result = py.allow_threads(|| crate::timefreq::timefrequency(&signal, &method))?;
    let time = result.time.into_iter().next().unwrap_or_default();
    let freq = result.freq.into_iter().next().unwrap_or_default();
    let cube = match result.data.into_iter().next() {
        Some(TimeFrequencyData::Complex(c)) => c,
        _ => return Err(PyValueError::new_err("wavelet transform produced no complex output")),
    };

    Ok((time.into_pyarray(py), freq.into_pyarray(py), cube.into_pyarray(py)))
}

/// Sampled complex Morlet wavelet
///
/// Args:
///     freq: Centre frequency in Hz
///     s_freq: Sampling frequency in Hz
///     ratio: freq / sigma_f
///     sigma_f: Frequency-domain standard deviation (overrides ratio)
///     dur_in_sd: One-sided duration in standard deviations
///     dur_in_s: Total duration in s (overrides dur_in_sd)
///     normalization: 'wonambi', 'juniper', 'area' or 'peak'
///     zero_mean: Remove the DC offset
///
/// Returns:
///     Complex wavelet as numpy array
#[pyfunction]
#[pyo3(signature = (
    freq, s_freq, ratio=5.0, sigma_f=None, dur_in_sd=4.0, dur_in_s=None,
    normalization="wonambi", zero_mean=false
))]
#[allow(clippy::too_many_arguments)]
pub fn morlet<'py>(
    py: Python<'py>,
    freq: f64,
    s_freq: f64,
    ratio: f64,
    sigma_f: Option<f64>,
    dur_in_sd: f64,
    dur_in_s: Option<f64>,
    normalization: &str,
    zero_mean: bool,
) -> PyResult<&'py PyArray1<Complex64>> {
    let params = morlet_params(ratio, sigma_f, dur_in_sd, dur_in_s, normalization, zero_mean)?;
    let wavelet = crate::timefreq::morlet(freq, s_freq, &params)?;
    Ok(wavelet.samples.into_pyarray(py))
}
