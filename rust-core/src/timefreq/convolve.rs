//! FFT-based convolution of real channels with complex wavelets
//!
//! Every (channel, wavelet) pair is an independent task. Tasks run on a
//! fixed-size rayon pool and are gathered back in submission order.

use super::morlet::Wavelet;
use crate::error::{Result, SpectralError};
use ndarray::{Array1, Array3, ArrayView1, ArrayView2};
use num_complex::Complex64;
use rayon::prelude::*;
use rayon::ThreadPool;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Linear convolution with a fixed kernel, cropped to the input length
///
/// The kernel spectrum is computed once; each call transforms the signal,
/// multiplies and transforms back. Complexity O(N log N) instead of O(N·M).
pub struct FftConvolver {
    /// Kernel in frequency domain
    kernel_fft: Vec<Complex64>,

    /// FFT size, power of 2 >= signal_len + kernel_len - 1
    fft_size: usize,

    kernel_len: usize,

    signal_len: usize,

    fft: Arc<dyn Fft<f64>>,

    ifft: Arc<dyn Fft<f64>>,
}

impl FftConvolver {
    /// Plan a convolver for signals of `signal_len` samples
    pub fn new(kernel: ArrayView1<Complex64>, signal_len: usize) -> Self {
        let kernel_len = kernel.len();
        let min_fft_size = (signal_len + kernel_len).saturating_sub(1).max(1);
        let fft_size = min_fft_size.next_power_of_two();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);

        let mut kernel_fft = vec![Complex64::new(0.0, 0.0); fft_size];
        for (dst, &k) in kernel_fft.iter_mut().zip(kernel.iter()) {
            *dst = k;
        }
        fft.process(&mut kernel_fft);

        Self {
            kernel_fft,
            fft_size,
            kernel_len,
            signal_len,
            fft,
            ifft,
        }
    }

    /// Centred part of the full convolution, same length as `signal`
    pub fn convolve_same(&self, signal: ArrayView1<f64>) -> Result<Array1<Complex64>> {
        if signal.len() != self.signal_len {
            return Err(SpectralError::Worker(format!(
                "convolver planned for {} samples got {}",
                self.signal_len,
                signal.len()
            )));
        }

        // 1. Copy input to complex buffer and zero-pad
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.fft_size];
        for (dst, &x) in buffer.iter_mut().zip(signal.iter()) {
            *dst = Complex64::new(x, 0.0);
        }

        // 2. Multiply in frequency domain
        self.fft.process(&mut buffer);
        for (b, k) in buffer.iter_mut().zip(self.kernel_fft.iter()) {
            *b *= k;
        }

        // 3. Inverse FFT, scaled by 1/N
        self.ifft.process(&mut buffer);
        let scale = 1.0 / self.fft_size as f64;

        let start = self.kernel_len.saturating_sub(1) / 2;
        Ok(buffer[start..start + self.signal_len]
            .iter()
            .map(|z| z * scale)
            .collect())
    }
}

/// "Same"-mode convolution of a real signal with a complex kernel
pub fn convolve_same(signal: ArrayView1<f64>, kernel: ArrayView1<Complex64>) -> Result<Array1<Complex64>> {
    FftConvolver::new(kernel, signal.len()).convolve_same(signal)
}

/// Fixed-size pool for [`convolve_bank`]; `None` uses all available cores
pub fn worker_pool(n_workers: Option<usize>) -> Result<ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = n_workers {
        builder = builder.num_threads(n);
    }
    Ok(builder.build()?)
}

/// Convolve every channel with every wavelet
///
/// # Arguments
/// * `block` - `[channel × time]` trial
/// * `wavelets` - Wavelet bank, one per frequency of interest
/// * `pool` - Workers running the (channel, wavelet) tasks
///
/// # Returns
/// `[channel × time × wavelet]` complex coefficients
pub fn convolve_bank(
    block: ArrayView2<f64>,
    wavelets: &[Wavelet],
    pool: &ThreadPool,
) -> Result<Array3<Complex64>> {
    let (n_chan, n_time) = block.dim();
    let convolvers: Vec<FftConvolver> = wavelets
        .iter()
        .map(|w| FftConvolver::new(w.samples.view(), n_time))
        .collect();

    // Channel-major, then wavelet within channel
    let tasks: Vec<(usize, usize)> = (0..n_chan)
        .flat_map(|c| (0..wavelets.len()).map(move |w| (c, w)))
        .collect();

    let results: Vec<Array1<Complex64>> = pool.install(|| {
        tasks
            .par_iter()
            .map(|&(c, w)| convolvers[w].convolve_same(block.row(c)))
            .collect::<Result<Vec<_>>>()
    })?;

    // [channel × wavelet × time] -> [channel × time × wavelet]
    let mut tf = Array3::zeros((n_chan, wavelets.len(), n_time));
    for (&(c, w), row) in tasks.iter().zip(results) {
        tf.slice_mut(ndarray::s![c, w, ..]).assign(&row);
    }
    Ok(tf.permuted_axes([0, 2, 1]).as_standard_layout().into_owned())
}

/// Direct O(N·M) "same" convolution, used as a reference
#[cfg(test)]
fn convolve_direct(signal: &[f64], kernel: &[Complex64]) -> Vec<Complex64> {
    let n = signal.len();
    let m = kernel.len();
    let mut full = vec![Complex64::new(0.0, 0.0); n + m - 1];
    for (i, &x) in signal.iter().enumerate() {
        for (j, &k) in kernel.iter().enumerate() {
            full[i + j] += k * x;
        }
    }
    let start = (m - 1) / 2;
    full[start..start + n].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timefreq::morlet::{morlet_bank, MorletParams};
    use ndarray::{array, Array2};

    #[test]
    fn test_impulse_returns_centred_kernel() {
        let kernel = array![
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 1.0),
            Complex64::new(3.0, -1.0)
        ];
        let mut signal = Array1::zeros(7);
        signal[3] = 1.0;
        let out = convolve_same(signal.view(), kernel.view()).unwrap();
        assert_eq!(out.len(), 7);
        // Centre of the kernel lands on the impulse
        assert!((out[2] - kernel[0]).norm() < 1e-12);
        assert!((out[3] - kernel[1]).norm() < 1e-12);
        assert!((out[4] - kernel[2]).norm() < 1e-12);
        assert!(out[0].norm() < 1e-12);
    }

    #[test]
    fn test_matches_direct_convolution() {
        let signal: Vec<f64> = (0..50).map(|i| ((i * 7 % 13) as f64 - 6.0) / 3.0).collect();
        for m in [1, 4, 9, 61] {
            let kernel: Vec<Complex64> = (0..m)
                .map(|j| Complex64::new((j as f64 * 0.3).cos(), (j as f64 * 0.7).sin()))
                .collect();
            let fast = convolve_same(
                ArrayView1::from(signal.as_slice()),
                ArrayView1::from(kernel.as_slice()),
            )
            .unwrap();
            let direct = convolve_direct(&signal, &kernel);
            for (a, b) in fast.iter().zip(direct.iter()) {
                assert!((a - b).norm() < 1e-9, "kernel length {m}");
            }
        }
    }

    #[test]
    fn test_bank_is_deterministic_across_pool_sizes() {
        let block = Array2::from_shape_fn((3, 300), |(c, i)| ((c + 1) as f64 * 0.05 * i as f64).sin());
        let wavelets = morlet_bank(&[5.0, 10.0, 20.0, 40.0], 100.0, &MorletParams::default()).unwrap();

        let serial = convolve_bank(block.view(), &wavelets, &worker_pool(Some(1)).unwrap()).unwrap();
        let pool = worker_pool(Some(4)).unwrap();
        assert_eq!(pool.current_num_threads(), 4);
        let parallel = convolve_bank(block.view(), &wavelets, &pool).unwrap();
        // Same pool reused for a second trial
        let again = convolve_bank(block.view(), &wavelets, &pool).unwrap();
        assert_eq!(parallel, again);
        assert_eq!(serial.shape(), &[3, 300, 4]);
        assert_eq!(serial, parallel);

        // Layout: [channel × time × wavelet] holds channel c convolved with wavelet w
        let expected = convolve_same(block.row(2), wavelets[1].samples.view()).unwrap();
        for t in 0..300 {
            assert_eq!(serial[[2, t, 1]], expected[t]);
        }
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let kernel = array![Complex64::new(1.0, 0.0)];
        let conv = FftConvolver::new(kernel.view(), 10);
        let signal = Array1::<f64>::zeros(11);
        assert!(matches!(conv.convolve_same(signal.view()), Err(SpectralError::Worker(_))));
    }
}
