//! Welch segmentation: overlapping windows, per-segment spectra, reduction
//!
//! Use of log-transform or median before reducing follows Izhikevich et al.
//! (bioRxiv, 2018).

use super::fft::{spectral_transform, CoreData, TransformParams};
use crate::datatype::SpectralData;
use crate::error::{Result, SpectralError};
use crate::options::CentralTendency;
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;

/// Convert seconds to a sample count, tolerating representation error
pub(crate) fn seconds_to_samples(seconds: f64, s_freq: f64) -> usize {
    let exact = seconds * s_freq;
    let rounded = exact.round();
    if (exact - rounded).abs() < 1e-9 * rounded.abs().max(1.0) {
        rounded.max(0.0) as usize
    } else {
        exact.floor().max(0.0) as usize
    }
}

/// Segment length and hop, in samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmentation {
    pub nperseg: usize,
    pub nstep: usize,
}

impl Segmentation {
    /// Segments of `duration` seconds, hopping by `step` seconds if given,
    /// otherwise overlapping by the fraction `overlap`
    pub fn from_duration(duration: f64, overlap: f64, step: Option<f64>, s_freq: f64) -> Result<Self> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(SpectralError::invalid("duration", format!("{duration} s is not a positive duration")));
        }
        let nperseg = seconds_to_samples(duration, s_freq);
        let nstep = match step {
            Some(step) => {
                if !(step.is_finite() && step > 0.0) {
                    return Err(SpectralError::invalid("step", format!("{step} s is not a positive step")));
                }
                seconds_to_samples(step, s_freq)
            }
            None => {
                if !(0.0..1.0).contains(&overlap) {
                    return Err(SpectralError::invalid("overlap", format!("{overlap} is not in [0, 1)")));
                }
                nperseg - (overlap * nperseg as f64) as usize
            }
        };
        Self::new(nperseg, nstep)
    }

    pub fn new(nperseg: usize, nstep: usize) -> Result<Self> {
        if nperseg == 0 {
            return Err(SpectralError::invalid("duration", "segment is shorter than one sample"));
        }
        if nstep == 0 {
            return Err(SpectralError::invalid("step", "segments do not advance"));
        }
        Ok(Self { nperseg, nstep })
    }

    /// First sample of every complete segment; the last partial one is dropped
    pub fn starts(&self, n_samples: usize) -> Result<Vec<usize>> {
        if n_samples < self.nperseg {
            return Err(SpectralError::SegmentTooLong {
                nperseg: self.nperseg,
                n_samples,
            });
        }
        Ok((0..=n_samples - self.nperseg).step_by(self.nstep).collect())
    }
}

/// Cut `[channel × time]` into `[channel × segment × nperseg]`
pub fn create_subepochs(x: ArrayView2<f64>, seg: &Segmentation) -> Result<Array3<f64>> {
    let starts = seg.starts(x.ncols())?;
    let mut out = Array3::zeros((x.nrows(), starts.len(), seg.nperseg));
    for (i, &start) in starts.iter().enumerate() {
        out.index_axis_mut(Axis(1), i)
            .assign(&x.slice(ndarray::s![.., start..start + seg.nperseg]));
    }
    Ok(out)
}

/// Mean time of every segment
pub fn segment_times(time: ArrayView1<f64>, seg: &Segmentation) -> Result<Array1<f64>> {
    let starts = seg.starts(time.len())?;
    Ok(starts
        .iter()
        .map(|&start| {
            time.slice(ndarray::s![start..start + seg.nperseg])
                .mean()
                .unwrap_or(f64::NAN)
        })
        .collect())
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n == 0 {
        f64::NAN
    } else if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

fn median_axis(data: &Array3<f64>, axis: Axis) -> Array2<f64> {
    let mut buf = Vec::with_capacity(data.len_of(axis));
    data.map_axis(axis, |lane| {
        buf.clear();
        buf.extend(lane.iter().copied());
        median(&mut buf)
    })
}

/// Reduce `[channel × segment × …]` core output over the segment axis
pub fn reduce_segments(data: CoreData, centend: CentralTendency) -> Result<SpectralData> {
    let segments = Axis(1);
    let empty = || SpectralError::invalid("duration", "no segment to average");

    match data {
        CoreData::Complex(_) => Err(SpectralError::ComplexAveraging),
        CoreData::Density(d) => Ok(SpectralData::Density(match centend {
            CentralTendency::Mean => d.mean_axis(segments).ok_or_else(empty)?,
            CentralTendency::Median => median_axis(&d, segments),
        })),
        CoreData::CrossSpectrum(c) => Ok(SpectralData::CrossSpectrum(match centend {
            CentralTendency::Mean => c.mean_axis(segments).ok_or_else(empty)?,
            CentralTendency::Median => {
                // Real and imaginary parts independently
                let re = median_axis(&c.mapv(|z| z.re), segments);
                let im = median_axis(&c.mapv(|z| z.im), segments);
                ndarray::Zip::from(&re)
                    .and(&im)
                    .map_collect(|&r, &i| Complex64::new(r, i))
            }
        })),
    }
}

/// Welch estimate of one `[channel × time]` trial
///
/// # Arguments
/// * `x` - Continuous trial
/// * `s_freq` - Sampling frequency in Hz
/// * `seg` - Segment length and hop
/// * `params` - Spectral core parameters (complex output is rejected)
/// * `log_trans` - Natural-log transform each segment before reducing
/// * `centend` - Mean or median across segments
pub fn welch(
    x: ArrayView2<f64>,
    s_freq: f64,
    seg: &Segmentation,
    params: &TransformParams,
    log_trans: bool,
    centend: CentralTendency,
) -> Result<(Array1<f64>, SpectralData)> {
    if params.output == crate::options::Output::Complex {
        return Err(SpectralError::ComplexAveraging);
    }
    let block = create_subepochs(x, seg)?;
    let transform = spectral_transform(block.view(), s_freq, params)?;
    let data = if log_trans {
        transform.data.ln()
    } else {
        transform.data
    };
    Ok((transform.freqs, reduce_segments(data, centend)?))
}
