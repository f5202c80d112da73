//! Power or complex spectrum over time
//!
//! `morlet` convolves each channel with a bank of wavelets. `spectrogram`
//! and `stft` cut the trial into overlapping windows and keep one spectrum
//! per window, so the segment axis becomes the time axis.

use super::convolve::{convolve_bank, worker_pool};
use super::morlet::{morlet_bank, MorletParams};
use crate::datatype::{Signal, TimeFrequencyData, TimeFrequencyResult};
use crate::error::{Result, SpectralError};
use crate::options::{Detrend, MethodName, Normalization, Output, Scaling, Sides, TaperKind};
use crate::spectrum::fft::{spectral_transform, CoreData, TransformParams};
use crate::spectrum::taper::TaperSpec;
use crate::spectrum::welch::{create_subepochs, segment_times, Segmentation};
use ndarray::{Array1, Axis};

/// Options of the wavelet method
#[derive(Debug, Clone, PartialEq)]
pub struct MorletConfig {
    /// Frequencies of interest in Hz
    pub foi: Vec<f64>,

    pub params: MorletParams,

    /// Worker threads for the convolutions; `None` uses all cores
    pub n_workers: Option<usize>,
}

impl Default for MorletConfig {
    fn default() -> Self {
        Self {
            foi: Vec::new(),
            params: MorletParams {
                normalization: Normalization::Area,
                ..MorletParams::default()
            },
            n_workers: None,
        }
    }
}

/// Options of the windowed methods (spectrogram, stft)
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentConfig {
    /// Window length in seconds
    pub duration: f64,

    /// Fractional overlap between windows (0 to 1)
    pub overlap: f64,

    /// Hop between windows in seconds, overrides `overlap`
    pub step: Option<f64>,

    pub detrend: Option<Detrend>,
    pub taper: TaperKind,
    pub sides: Sides,
    pub scaling: Scaling,

    /// DPSS half bandwidth in Hz
    pub halfbandwidth: f64,

    /// DPSS normalized half bandwidth, overrides `halfbandwidth`
    pub nw: Option<f64>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            duration: 1.0,
            overlap: 0.5,
            step: None,
            detrend: Some(Detrend::Linear),
            taper: TaperKind::Hann,
            sides: Sides::One,
            scaling: Scaling::Power,
            halfbandwidth: 2.0,
            nw: None,
        }
    }
}

impl SegmentConfig {
    fn transform_params(&self, output: Output) -> TransformParams {
        TransformParams {
            detrend: self.detrend,
            taper: TaperSpec {
                kind: self.taper,
                halfbandwidth: self.halfbandwidth,
                nw: self.nw,
            },
            output,
            sides: self.sides,
            scaling: self.scaling,
            n_fft: None,
        }
    }
}

/// Time-frequency method and its options
#[derive(Debug, Clone, PartialEq)]
pub enum TimeFrequencyMethod {
    /// Complex wavelet coefficients at each frequency of interest
    Morlet(MorletConfig),
    /// Spectral density of each window
    Spectrogram(SegmentConfig),
    /// Complex spectrum of each window
    Stft(SegmentConfig),
}

impl TimeFrequencyMethod {
    /// Method with default options
    pub fn with_defaults(name: MethodName) -> Self {
        match name {
            MethodName::Morlet => Self::Morlet(MorletConfig::default()),
            MethodName::Spectrogram => Self::Spectrogram(SegmentConfig::default()),
            MethodName::Stft => Self::Stft(SegmentConfig::default()),
        }
    }

    pub fn name(&self) -> MethodName {
        match self {
            Self::Morlet(_) => MethodName::Morlet,
            Self::Spectrogram(_) => MethodName::Spectrogram,
            Self::Stft(_) => MethodName::Stft,
        }
    }
}

/// Compute the time-frequency representation of every trial
///
/// Uses the sampling frequency stored in the signal; it is not recomputed
/// from the time axis.
///
/// # Returns
/// * `Morlet` - complex `[channel × time × freq]`, time axis of the trial
/// * `Spectrogram` - density `[channel × window × freq]`, mean time of each window
/// * `Stft` - complex `[channel × window × freq × taper]`
pub fn timefrequency(signal: &Signal, method: &TimeFrequencyMethod) -> Result<TimeFrequencyResult> {
    signal.check_time_last()?;

    let n_trials = signal.n_trials();
    let mut time = Vec::with_capacity(n_trials);
    let mut freq = Vec::with_capacity(n_trials);
    let mut data = Vec::with_capacity(n_trials);
    let mut taper = Vec::new();

    match method {
        TimeFrequencyMethod::Morlet(config) => {
            let wavelets = morlet_bank(&config.foi, signal.s_freq, &config.params)?;
            let foi = Array1::from_iter(wavelets.iter().map(|w| w.freq));
            let pool = worker_pool(config.n_workers)?;

            for (i, trial) in signal.trials.iter().enumerate() {
                log::info!("Processing trial # {i:6}");
                let tf = convolve_bank(trial.data.view(), &wavelets, &pool)?;
                time.push(trial.time.clone());
                freq.push(foi.clone());
                data.push(TimeFrequencyData::Complex(tf));
            }
        }
        TimeFrequencyMethod::Spectrogram(config) | TimeFrequencyMethod::Stft(config) => {
            let output = match method {
                TimeFrequencyMethod::Stft(_) => Output::Complex,
                _ => Output::SpectralDensity,
            };
            let seg = Segmentation::from_duration(config.duration, config.overlap, config.step, signal.s_freq)?;
            let params = config.transform_params(output);

            for (i, trial) in signal.trials.iter().enumerate() {
                log::info!("Processing trial # {i:6}");
                let block = create_subepochs(trial.data.view(), &seg)?;
                let transform = spectral_transform(block.view(), signal.s_freq, &params)?;

                time.push(segment_times(trial.time.view(), &seg)?);
                freq.push(transform.freqs);
                data.push(match transform.data {
                    CoreData::Density(d) => TimeFrequencyData::Density(d),
                    CoreData::Complex(c) => {
                        taper.push(Array1::from_iter(0..c.len_of(Axis(3))));
                        TimeFrequencyData::Stft(c)
                    }
                    CoreData::CrossSpectrum(_) => {
                        return Err(SpectralError::invalid("output", "cross-spectrum has no time axis"))
                    }
                });
            }
        }
    }

    Ok(TimeFrequencyResult {
        s_freq: signal.s_freq,
        start_time: signal.start_time,
        attr: signal.attr.clone(),
        chan: signal.trials.iter().map(|t| t.chan.clone()).collect(),
        time,
        freq,
        taper: matches!(method, TimeFrequencyMethod::Stft(_)).then_some(taper),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn sine_signal() -> Signal {
        let s_freq = 256.0;
        let data = Array2::from_shape_fn((2, 2560), |(c, i)| {
            (1.0 + c as f64) * (2.0 * PI * 10.0 * i as f64 / s_freq).sin()
        });
        Signal::from_array(data, s_freq).unwrap().with_attr("subject", "s01")
    }

    #[test]
    fn test_morlet_tracks_steady_oscillation() {
        let signal = sine_signal();
        let method = TimeFrequencyMethod::Morlet(MorletConfig {
            foi: vec![10.0],
            params: MorletParams {
                normalization: Normalization::Wonambi,
                ..MorletParams::default()
            },
            n_workers: Some(2),
        });
        let tf = timefrequency(&signal, &method).unwrap();

        assert_eq!(tf.attr["subject"], "s01");
        assert_eq!(tf.freq[0].to_vec(), vec![10.0]);
        assert_eq!(tf.time[0].len(), 2560);
        let TimeFrequencyData::Complex(cube) = &tf.data[0] else {
            panic!("morlet output must be complex");
        };
        assert_eq!(cube.shape(), &[2, 2560, 1]);

        // Wavelet spans 4 s; stay 2.5 s away from either edge
        for t in 640..1920 {
            let first = cube[[0, t, 0]].norm();
            let second = cube[[1, t, 0]].norm();
            assert!((first - 1.0).abs() < 1e-3, "sample {t}: {first}");
            assert!((second - 2.0).abs() < 2e-3, "sample {t}: {second}");
        }
    }

    #[test]
    fn test_morlet_trials_share_one_pool() {
        let s_freq = 128.0;
        let trials = (0..3)
            .map(|k| {
                let data = Array2::from_shape_fn((1, 640), |(_, i)| {
                    (k + 1) as f64 * (2.0 * PI * 8.0 * i as f64 / s_freq).sin()
                });
                crate::datatype::Trial::new(data, vec!["cz".into()], s_freq, 0.0).unwrap()
            })
            .collect();
        let signal = Signal::new(trials, s_freq, 0.0).unwrap();
        let method = TimeFrequencyMethod::Morlet(MorletConfig {
            foi: vec![8.0, 16.0],
            n_workers: Some(3),
            ..MorletConfig::default()
        });
        let tf = timefrequency(&signal, &method).unwrap();

        assert_eq!(tf.data.len(), 3);
        let first = match &tf.data[0] {
            TimeFrequencyData::Complex(c) => c.clone(),
            other => panic!("unexpected output {other:?}"),
        };
        for (k, data) in tf.data.iter().enumerate() {
            let TimeFrequencyData::Complex(c) = data else {
                panic!("morlet output must be complex");
            };
            assert_eq!(c.shape(), &[1, 640, 2]);
            // Linear in the input amplitude
            let ratio = c[[0, 320, 0]].norm() / first[[0, 320, 0]].norm();
            assert!((ratio - (k + 1) as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_morlet_needs_frequencies() {
        let signal = sine_signal();
        assert_eq!(
            timefrequency(&signal, &TimeFrequencyMethod::with_defaults(MethodName::Morlet)).unwrap_err(),
            SpectralError::EmptyFrequencies
        );
    }

    #[test]
    fn test_spectrogram_windows() {
        let signal = sine_signal();
        let tf = timefrequency(&signal, &TimeFrequencyMethod::with_defaults(MethodName::Spectrogram)).unwrap();
        assert!(tf.taper.is_none());

        // 1 s windows with 50% overlap over 10 s
        assert_eq!(tf.time[0].len(), 19);
        assert!((tf.time[0][0] - 255.0 / 2.0 / 256.0).abs() < 1e-12);
        assert_eq!(tf.freq[0].len(), 129);

        let TimeFrequencyData::Density(sxx) = &tf.data[0] else {
            panic!("spectrogram output must be a density");
        };
        assert_eq!(sxx.shape(), &[2, 19, 129]);
        for w in 0..19 {
            let row = sxx.slice(ndarray::s![0, w, ..]);
            let (peak, _) = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .unwrap();
            assert_eq!(peak, 10);
        }
    }

    #[test]
    fn test_stft_keeps_taper_axis() {
        let signal = sine_signal();
        let method = TimeFrequencyMethod::Stft(SegmentConfig {
            step: Some(0.5),
            ..SegmentConfig::default()
        });
        assert_eq!(method.name(), MethodName::Stft);
        let tf = timefrequency(&signal, &method).unwrap();

        let TimeFrequencyData::Stft(c) = &tf.data[0] else {
            panic!("stft output must be complex");
        };
        assert_eq!(c.shape(), &[2, 19, 256, 1]);
        assert_eq!(tf.taper.as_ref().unwrap()[0].to_vec(), vec![0]);
    }

    #[test]
    fn test_window_longer_than_trial() {
        let signal = sine_signal();
        let method = TimeFrequencyMethod::Spectrogram(SegmentConfig {
            duration: 20.0,
            ..SegmentConfig::default()
        });
        assert!(matches!(
            timefrequency(&signal, &method),
            Err(SpectralError::SegmentTooLong { nperseg: 5120, n_samples: 2560 })
        ));
    }
}
