//! PyO3 bindings for Python integration

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::datatype::{Signal, Trial};
use crate::error::SpectralError;
use numpy::PyReadonlyArray2;

mod spectrum_bindings;
mod timefreq_bindings;

impl From<SpectralError> for PyErr {
    fn from(err: SpectralError) -> PyErr {
        match &err {
            SpectralError::Fft(_) | SpectralError::Worker(_) => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Wrap a `[channel × time]` numpy array as a single-trial signal
fn signal_from_numpy(data: PyReadonlyArray2<f64>, s_freq: f64, chan: Option<Vec<String>>) -> PyResult<Signal> {
    let data = data.as_array().to_owned();
    let chan = chan.unwrap_or_else(|| (0..data.nrows()).map(|i| format!("chan{i}")).collect());
    let trial = Trial::new(data, chan, s_freq, 0.0)?;
    Ok(Signal::new(vec![trial], s_freq, 0.0)?)
}

/// Python module definition
#[pymodule]
fn tfspectra(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(spectrum_bindings::frequency, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::band_power, m)?)?;
    m.add_function(wrap_pyfunction!(timefreq_bindings::timefrequency_morlet, m)?)?;
    m.add_function(wrap_pyfunction!(timefreq_bindings::morlet, m)?)?;

    Ok(())
}
