//! Python bindings for spectral analysis

use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::prelude::*;

use super::signal_from_numpy;
use crate::datatype::{SpectralData, SpectralResult};
use crate::options::parse_detrend;
use crate::spectrum::{BandPowerConfig, FrequencyConfig};

/// Spectral density, cross-spectral density or complex spectrum
///
/// Args:
///     data: 2D array, channels × time
///     s_freq: Sampling frequency in Hz
///     output: 'spectraldensity', 'csd' or 'complex'
///     scaling: 'power', 'energy', 'fieldtrip' or 'chronux'
///     sides: 'one' or 'two'
///     taper: 'boxcar', 'hann' or 'dpss'
///     halfbandwidth: DPSS half bandwidth in Hz
///     nw: DPSS normalized half bandwidth (overrides halfbandwidth)
///     duration: Welch segment length in s (None for the whole signal)
///     overlap: Fractional overlap between segments
///     step: Hop between segments in s (overrides overlap)
///     detrend: 'constant', 'linear' or None
///     n_fft: FFT length in samples
///     log_trans: Log-transform each segment before averaging
///     centend: 'mean' or 'median'
///     chan: Channel labels
///
/// Returns:
///     Tuple of (frequencies, spectrum). The spectrum is channels × freq,
///     1 × freq (csd) or channels × freq × taper (complex).
#[pyfunction]
#[pyo3(signature = (
    data, s_freq, output="spectraldensity", scaling="power", sides="one", taper="boxcar",
    halfbandwidth=3.0, nw=None, duration=None, overlap=0.5, step=None, detrend=Some("linear"),
    n_fft=None, log_trans=false, centend="mean", chan=None
))]
#[allow(clippy::too_many_arguments)]
pub fn frequency<'py>(
    py: Python<'py>,
    data: PyReadonlyArray2<f64>,
    s_freq: f64,
    output: &str,
    scaling: &str,
    sides: &str,
    taper: &str,
    halfbandwidth: f64,
    nw: Option<f64>,
    duration: Option<f64>,
    overlap: f64,
    step: Option<f64>,
    detrend: Option<&str>,
    n_fft: Option<usize>,
    log_trans: bool,
    centend: &str,
    chan: Option<Vec<String>>,
) -> PyResult<(&'py PyArray1<f64>, PyObject)> {
    let config = FrequencyConfig {
        output: output.parse()?,
        scaling: scaling.parse()?,
        sides: sides.parse()?,
        taper: taper.parse()?,
        halfbandwidth,
        nw,
        duration,
        overlap,
        step,
        detrend: parse_detrend(detrend.unwrap_or("none"))?,
        n_fft,
        log_trans,
        centend: centend.parse()?,
    };
    let signal = signal_from_numpy(data, s_freq, chan)?;

    let result = py.allow_threads(|| crate::spectrum::frequency(&signal, &config))?;
    let freqs = result.freq.into_iter().next().unwrap_or_default();
    let spectrum: PyObject = match result.data.into_iter().next() {
        Some(SpectralData::Density(d)) => d.into_pyarray(py).to_object(py),
        Some(SpectralData::CrossSpectrum(c)) => c.into_pyarray(py).to_object(py),
        Some(SpectralData::Complex(c)) => c.into_pyarray(py).to_object(py),
        None => py.None(),
    };

    Ok((freqs.into_pyarray(py), spectrum))
}

/// Power within a frequency band and the frequency of its peak
///
/// Args:
///     data: 2D array, channels × time, or channels × freq when `freqs` is given
///     s_freq: Sampling frequency in Hz
///     f_low: Lower edge in Hz (None for the first bin)
///     f_high: Upper edge in Hz, inclusive (None for the last bin)
///     scaling: 'power' or 'energy'
///     n_fft: FFT length in samples
///     detrend: 'constant', 'linear' or None (linear for power, none for energy)
///     array_out: Return arrays instead of dicts keyed by channel
///     chan: Channel labels
///     freqs: Frequency axis of a precomputed spectral density in `data`;
///         scaling, n_fft and detrend are then ignored
///
/// Returns:
///     Tuple of (power, peak frequency)
#[pyfunction]
#[pyo3(signature = (
    data, s_freq, f_low=None, f_high=None, scaling="power", n_fft=None, detrend=None,
    array_out=false, chan=None, freqs=None
))]
#[allow(clippy::too_many_arguments)]
pub fn band_power(
    py: Python<'_>,
    data: PyReadonlyArray2<f64>,
    s_freq: f64,
    f_low: Option<f64>,
    f_high: Option<f64>,
    scaling: &str,
    n_fft: Option<usize>,
    detrend: Option<&str>,
    array_out: bool,
    chan: Option<Vec<String>>,
    freqs: Option<PyReadonlyArray1<f64>>,
) -> PyResult<(PyObject, PyObject)> {
    let config = BandPowerConfig {
        scaling: scaling.parse()?,
        n_fft,
        detrend: detrend.map(parse_detrend).transpose()?.flatten(),
    };
    let band = (f_low, f_high);

    let bp = match freqs {
        Some(freqs) => {
            let density = data.as_array().to_owned();
            let chan = chan.unwrap_or_else(|| (0..density.nrows()).map(|i| format!("chan{i}")).collect());
            let spectrum = SpectralResult::from_density(freqs.as_array().to_owned(), density, chan, s_freq)?;
            crate::spectrum::band_power(&spectrum, band, &config)?
        }
        None => {
            let signal = signal_from_numpy(data, s_freq, chan)?;
            py.allow_threads(|| crate::spectrum::band_power(&signal, band, &config))?
        }
    };
    if array_out {
        let (power, peak) = (bp.power.into_pyarray(py), bp.peak_freq.into_pyarray(py));
        Ok((power.to_object(py), peak.to_object(py)))
    } else {
        let (power, peak) = bp.to_maps();
        Ok((power.to_object(py), peak.to_object(py)))
    }
}
