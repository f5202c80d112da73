//! Frequency-domain representation of a multi-trial signal
//!
//! Combines the taper builder, the spectral core and (optionally) Welch
//! segmentation into the `frequency` entry point.

use super::fft::{spectral_transform, CoreData, TransformParams};
use super::taper::TaperSpec;
use super::welch::{welch, Segmentation};
use crate::datatype::{Signal, SpectralData, SpectralResult};
use crate::error::{Result, SpectralError};
use crate::options::{CentralTendency, Detrend, Output, Scaling, Sides, TaperKind};
use ndarray::{Array1, Axis};

/// Options of [`frequency`]
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyConfig {
    /// Spectral density, cross-spectral density or complex spectrum
    pub output: Output,

    /// Power (units²/Hz), energy (units²), or a toolbox-compatible scaling
    pub scaling: Scaling,

    /// One- or two-sided spectrum (complex output is always two-sided)
    pub sides: Sides,

    pub taper: TaperKind,

    /// DPSS half bandwidth in Hz
    pub halfbandwidth: f64,

    /// DPSS normalized half bandwidth, overrides `halfbandwidth`
    pub nw: Option<f64>,

    /// Welch segment length in seconds; `None` analyses each trial whole
    pub duration: Option<f64>,

    /// Fractional overlap between segments (0 to 1)
    pub overlap: f64,

    /// Hop between segments in seconds, overrides `overlap`
    pub step: Option<f64>,

    pub detrend: Option<Detrend>,

    /// FFT length in samples (crop or zero-pad)
    pub n_fft: Option<usize>,

    /// Natural-log transform before averaging
    pub log_trans: bool,

    /// Reduction across Welch segments
    pub centend: CentralTendency,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            output: Output::SpectralDensity,
            scaling: Scaling::Power,
            sides: Sides::One,
            taper: TaperKind::Boxcar,
            halfbandwidth: 3.0,
            nw: None,
            duration: None,
            overlap: 0.5,
            step: None,
            detrend: Some(Detrend::Linear),
            n_fft: None,
            log_trans: false,
            centend: CentralTendency::Mean,
        }
    }
}

impl FrequencyConfig {
    pub fn taper_spec(&self) -> TaperSpec {
        TaperSpec {
            kind: self.taper,
            halfbandwidth: self.halfbandwidth,
            nw: self.nw,
        }
    }

    pub fn transform_params(&self) -> TransformParams {
        TransformParams {
            detrend: self.detrend,
            taper: self.taper_spec(),
            output: self.output,
            sides: self.sides,
            scaling: self.scaling,
            n_fft: self.n_fft,
        }
    }
}

/// Drop the segment axis of a single-segment core result
fn single_segment(data: CoreData) -> SpectralData {
    match data {
        CoreData::Density(d) => SpectralData::Density(d.index_axis_move(Axis(1), 0)),
        CoreData::CrossSpectrum(c) => SpectralData::CrossSpectrum(c.index_axis_move(Axis(1), 0)),
        CoreData::Complex(c) => SpectralData::Complex(c.index_axis_move(Axis(1), 0)),
    }
}

/// Compute the power/energy spectral density, cross-spectral density or
/// complex Fourier transform of every trial
///
/// With `duration` set, each trial is cut into overlapping segments whose
/// spectra are averaged (Welch). The sampling frequency is taken from the
/// signal, not recomputed from its time axis.
///
/// # Errors
/// Fails before any computation if `time` is not the last axis, if
/// complex output is combined with `duration`, or if CSD is requested on
/// other than two channels.
pub fn frequency(signal: &Signal, config: &FrequencyConfig) -> Result<SpectralResult> {
    signal.check_time_last()?;
    if config.duration.is_some() && config.output == Output::Complex {
        return Err(SpectralError::ComplexAveraging);
    }
    if config.output == Output::Csd {
        if let Some(trial) = signal.trials.iter().find(|t| t.n_chan() != 2) {
            return Err(SpectralError::CsdChannelCount(trial.n_chan()));
        }
    }
    let segmentation = config
        .duration
        .map(|duration| Segmentation::from_duration(duration, config.overlap, config.step, signal.s_freq))
        .transpose()?;

    let params = config.transform_params();
    let n_trials = signal.n_trials();
    let mut freq = Vec::with_capacity(n_trials);
    let mut data = Vec::with_capacity(n_trials);
    let mut chan = Vec::with_capacity(n_trials);
    let mut taper = Vec::new();

    for (i, trial) in signal.trials.iter().enumerate() {
        log::debug!("Frequency analysis of trial {i}");

        let (f, sxx) = match &segmentation {
            Some(seg) => welch(
                trial.data.view(),
                signal.s_freq,
                seg,
                &params,
                config.log_trans,
                config.centend,
            )?,
            None => {
                let block = trial.data.view().insert_axis(Axis(1));
                let transform = spectral_transform(block, signal.s_freq, &params)?;
                let core = if config.log_trans {
                    transform.data.ln()
                } else {
                    transform.data
                };
                (transform.freqs, single_segment(core))
            }
        };

        if let SpectralData::Complex(c) = &sxx {
            taper.push(Array1::from_iter(0..c.len_of(Axis(2))));
        }
        chan.push(match config.output {
            Output::Csd => vec![trial.chan.join(" * ")],
            _ => trial.chan.clone(),
        });
        freq.push(f);
        data.push(sxx);
    }

    Ok(SpectralResult {
        s_freq: signal.s_freq,
        start_time: signal.start_time,
        attr: signal.attr.clone(),
        chan,
        freq,
        taper: (config.output == Output::Complex).then_some(taper),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::Trial;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn sine_signal(freq_hz: f64, s_freq: f64, seconds: f64, n_chan: usize) -> Signal {
        let n = (s_freq * seconds) as usize;
        let data = Array2::from_shape_fn((n_chan, n), |(c, i)| {
            (2.0 * PI * freq_hz * i as f64 / s_freq + c as f64).sin()
        });
        Signal::from_array(data, s_freq).unwrap()
    }

    fn peak_frequency(freqs: &Array1<f64>, density: ndarray::ArrayView1<f64>) -> f64 {
        let (idx, _) = density
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        freqs[idx]
    }

    #[test]
    fn test_hann_psd_peak_at_sine_frequency() {
        let signal = sine_signal(10.0, 256.0, 10.0, 1);
        let config = FrequencyConfig {
            taper: TaperKind::Hann,
            ..FrequencyConfig::default()
        };
        let result = frequency(&signal, &config).unwrap();

        let freqs = &result.freq[0];
        assert_eq!(freqs.len(), 1281);
        assert!((result.resolution(0).unwrap() - 0.1).abs() < 1e-12);
        let psd = result.data[0].as_density().unwrap();
        let peak = peak_frequency(freqs, psd.row(0));
        assert!((peak - 10.0).abs() <= 0.1);
    }

    #[test]
    fn test_metadata_is_copied() {
        let signal = sine_signal(5.0, 100.0, 2.0, 2).with_attr("subject", "s01");
        let result = frequency(&signal, &FrequencyConfig::default()).unwrap();
        assert_eq!(result.attr.get("subject").map(String::as_str), Some("s01"));
        assert_eq!(result.chan[0], vec!["chan0".to_string(), "chan1".to_string()]);
        assert!(result.taper.is_none());
        assert_eq!(result.data[0].as_density().unwrap().shape(), &[2, 101]);
    }

    #[test]
    fn test_multiple_trials() {
        let s_freq = 100.0;
        let trials = (0..3)
            .map(|k| {
                let data = Array2::from_shape_fn((1, 200 + 50 * k), |(_, i)| (0.3 * i as f64).sin());
                Trial::new(data, vec!["Cz".into()], s_freq, 0.0).unwrap()
            })
            .collect();
        let signal = Signal::new(trials, s_freq, 0.0).unwrap();
        let result = frequency(&signal, &FrequencyConfig::default()).unwrap();
        assert_eq!(result.n_trials(), 3);
        assert_eq!(result.freq[0].len(), 101);
        assert_eq!(result.freq[2].len(), 151);
    }

    #[test]
    fn test_welch_reduces_frequency_resolution() {
        let signal = sine_signal(10.0, 256.0, 10.0, 1);
        let config = FrequencyConfig {
            taper: TaperKind::Hann,
            duration: Some(2.0),
            ..FrequencyConfig::default()
        };
        let result = frequency(&signal, &config).unwrap();
        assert!((result.resolution(0).unwrap() - 0.5).abs() < 1e-12);
        let psd = result.data[0].as_density().unwrap();
        assert!((peak_frequency(&result.freq[0], psd.row(0)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dpss_multitaper() {
        let signal = sine_signal(20.0, 200.0, 4.0, 1);
        let config = FrequencyConfig {
            taper: TaperKind::Dpss,
            halfbandwidth: 1.0,
            detrend: None,
            scaling: Scaling::Energy,
            ..FrequencyConfig::default()
        };
        let result = frequency(&signal, &config).unwrap();
        let esd = result.data[0].as_density().unwrap();
        assert!((peak_frequency(&result.freq[0], esd.row(0)) - 20.0).abs() <= 1.0);
        // Orthonormal tapers keep the total energy close to the mean square
        let total: f64 = esd.sum();
        assert!((total - 0.5).abs() < 0.05, "total {total}");
    }

    #[test]
    fn test_complex_output_has_taper_axis() {
        let signal = sine_signal(10.0, 100.0, 1.0, 2);
        let config = FrequencyConfig {
            output: Output::Complex,
            ..FrequencyConfig::default()
        };
        let result = frequency(&signal, &config).unwrap();
        let taper = result.taper.as_ref().unwrap();
        assert_eq!(taper[0].to_vec(), vec![0]);
        match &result.data[0] {
            SpectralData::Complex(c) => assert_eq!(c.shape(), &[2, 100, 1]),
            other => panic!("unexpected {other:?}"),
        }
        // Two-sided, ascending
        let f = &result.freq[0];
        assert!(f.iter().zip(f.iter().skip(1)).all(|(a, b)| b > a));
    }

    #[test]
    fn test_csd_labels_and_shape() {
        let signal = sine_signal(10.0, 100.0, 2.0, 2);
        let config = FrequencyConfig {
            output: Output::Csd,
            duration: Some(0.5),
            ..FrequencyConfig::default()
        };
        let result = frequency(&signal, &config).unwrap();
        assert_eq!(result.chan[0], vec!["chan0 * chan1".to_string()]);
        match &result.data[0] {
            SpectralData::CrossSpectrum(c) => assert_eq!(c.shape(), &[1, 26]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_contract_violations_fail_fast() {
        let signal = sine_signal(10.0, 100.0, 2.0, 3);

        let complex_welch = FrequencyConfig {
            output: Output::Complex,
            duration: Some(1.0),
            ..FrequencyConfig::default()
        };
        assert_eq!(frequency(&signal, &complex_welch).unwrap_err(), SpectralError::ComplexAveraging);

        let csd = FrequencyConfig {
            output: Output::Csd,
            ..FrequencyConfig::default()
        };
        assert_eq!(frequency(&signal, &csd).unwrap_err(), SpectralError::CsdChannelCount(3));

        let mut transposed = signal.clone();
        transposed.axes = vec!["time".into(), "chan".into()];
        assert!(matches!(
            frequency(&transposed, &FrequencyConfig::default()),
            Err(SpectralError::TimeAxisNotLast(_))
        ));

        let too_long = FrequencyConfig {
            duration: Some(5.0),
            ..FrequencyConfig::default()
        };
        assert!(matches!(
            frequency(&signal, &too_long),
            Err(SpectralError::SegmentTooLong { .. })
        ));
    }

    #[test]
    fn test_log_trans_without_segments() {
        let signal = sine_signal(10.0, 100.0, 2.0, 1);
        let plain = frequency(&signal, &FrequencyConfig::default()).unwrap();
        let logged = frequency(
            &signal,
            &FrequencyConfig {
                log_trans: true,
                ..FrequencyConfig::default()
            },
        )
        .unwrap();
        let p = plain.data[0].as_density().unwrap();
        let l = logged.data[0].as_density().unwrap();
        assert!((p[[0, 20]].ln() - l[[0, 20]]).abs() < 1e-12);
    }
}
