//! tfspectra - Spectral and Time-Frequency Analysis Core
//!
//! Power/energy spectra, cross-spectra, complex spectra, Welch averaging,
//! Morlet wavelet transforms and band power of multichannel, multi-trial
//! signals, with optional Python bindings.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod error;
pub mod options;
pub mod datatype;
pub mod spectrum;
pub mod timefreq;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use datatype::{Signal, SpectralData, SpectralResult, TimeFrequencyData, TimeFrequencyResult, Trial};
pub use error::{Result, SpectralError};
pub use spectrum::{band_power, frequency, BandPower, BandPowerConfig, BandPowerInput, FrequencyConfig};
pub use timefreq::{morlet, timefrequency, MorletConfig, MorletParams, SegmentConfig, TimeFrequencyMethod, Wavelet};
