//! Time-frequency analysis: Morlet wavelets, wavelet convolution, spectrogram

pub mod morlet;
pub mod convolve;
pub mod transform;

pub use morlet::{morlet, morlet_bank, MorletParams, Wavelet};
pub use convolve::{convolve_bank, convolve_same, worker_pool, FftConvolver};
pub use transform::{timefrequency, MorletConfig, SegmentConfig, TimeFrequencyMethod};
