//! Error type shared by the spectral and time-frequency engines

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectralError {
    #[error("Invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("'time' is not in the axis {0:?}")]
    MissingTimeAxis(Vec<String>),

    #[error("'time' should be the last axis (found {0:?})")]
    TimeAxisNotLast(Vec<String>),

    #[error("Cannot average the complex spectrum over multiple epochs")]
    ComplexAveraging,

    #[error("CSD can only be computed between two channels (found {0})")]
    CsdChannelCount(usize),

    #[error("Segment of {nperseg} samples does not fit in a signal of {n_samples} samples")]
    SegmentTooLong { nperseg: usize, n_samples: usize },

    #[error("No frequency of interest was given")]
    EmptyFrequencies,

    #[error("Signal contains no trials")]
    EmptySignal,

    #[error("Band ({0:?}, {1:?}) selects no frequency bins")]
    EmptyBand(Option<f64>, Option<f64>),

    #[error("Band power requires a real spectral density, not {0}")]
    NotADensity(&'static str),

    #[error("FFT failed: {0}")]
    Fft(String),

    #[error("Worker pool failed: {0}")]
    Worker(String),
}

impl SpectralError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SpectralError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<realfft::FftError> for SpectralError {
    fn from(err: realfft::FftError) -> Self {
        SpectralError::Fft(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for SpectralError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        SpectralError::Worker(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpectralError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SpectralError::CsdChannelCount(3);
        assert_eq!(
            err.to_string(),
            "CSD can only be computed between two channels (found 3)"
        );

        let err = SpectralError::invalid("centend", "use mean or median, not \"mode\"");
        assert!(err.to_string().contains("centend"));
    }
}
