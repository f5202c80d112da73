//! Spectral analysis: tapers, FFT core, Welch averaging and band power

pub mod taper;
pub mod dpss;
pub mod detrend;
pub mod fft;
pub mod welch;
pub mod analysis;
pub mod band_power;

pub use taper::{build_tapers, TaperSpec};
pub use dpss::dpss_windows;
pub use detrend::detrend;
pub use fft::{spectral_transform, FftEngine, TransformParams};
pub use welch::{welch, Segmentation};
pub use analysis::{frequency, FrequencyConfig};
pub use band_power::{band_power, BandPower, BandPowerConfig, BandPowerInput};
