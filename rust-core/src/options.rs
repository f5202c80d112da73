//! Closed mode enums for the analysis entry points
//!
//! Each enum parses from (and prints as) the lowercase name used by the
//! public API, so string-typed callers (e.g. the Python bindings) are
//! validated once, at the boundary.

use crate::error::SpectralError;
use std::fmt;
use std::str::FromStr;

macro_rules! named_modes {
    (
        $(#[$meta:meta])*
        $name:ident, $param:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Lowercase name accepted by `FromStr`
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SpectralError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(SpectralError::invalid(
                        $param,
                        format!(
                            "\"{}\" is not one of {}",
                            other,
                            [$( $text ),+].join(", ")
                        ),
                    )),
                }
            }
        }
    };
}

named_modes! {
    /// What the spectral core returns
    Output, "output" {
        /// Auto-spectral density (PSD or ESD depending on scaling)
        SpectralDensity => "spectraldensity",
        /// Complex Fourier coefficients, one set per taper
        Complex => "complex",
        /// Cross-spectral density between exactly two channels
        Csd => "csd",
    }
}

named_modes! {
    /// Normalization convention of the spectral estimate
    Scaling, "scaling" {
        /// Units²/Hz
        Power => "power",
        /// Units²
        Energy => "energy",
        /// FieldTrip-compatible (does not satisfy Parseval)
        Fieldtrip => "fieldtrip",
        /// Chronux-compatible (does not satisfy Parseval)
        Chronux => "chronux",
    }
}

named_modes! {
    /// One-sided (non-negative frequencies) or two-sided spectrum
    Sides, "sides" {
        One => "one",
        Two => "two",
    }
}

named_modes! {
    /// Taper family
    TaperKind, "taper" {
        Boxcar => "boxcar",
        Hann => "hann",
        /// Discrete prolate spheroidal sequences (multitaper)
        Dpss => "dpss",
    }
}

named_modes! {
    /// Trend removed along the time axis before tapering
    Detrend, "detrend" {
        /// Remove the mean
        Constant => "constant",
        /// Remove the least-squares line
        Linear => "linear",
    }
}

named_modes! {
    /// Reduction across Welch segments
    CentralTendency, "centend" {
        Mean => "mean",
        Median => "median",
    }
}

named_modes! {
    /// Amplitude normalization of a Morlet wavelet
    Normalization, "normalization" {
        /// Unit amplitude output for a unit sine wave
        Wonambi => "wonambi",
        /// Amplitude depends on sampling frequency
        Juniper => "juniper",
        /// Unit energy of the Gaussian envelope
        Area => "area",
        /// Unit peak of the Gaussian envelope
        Peak => "peak",
    }
}

named_modes! {
    /// Names of the time-frequency methods
    MethodName, "method" {
        Morlet => "morlet",
        Spectrogram => "spectrogram",
        Stft => "stft",
    }
}

impl Default for Output {
    fn default() -> Self {
        Output::SpectralDensity
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling::Power
    }
}

impl Default for Sides {
    fn default() -> Self {
        Sides::One
    }
}

impl Default for TaperKind {
    fn default() -> Self {
        TaperKind::Boxcar
    }
}

impl Default for CentralTendency {
    fn default() -> Self {
        CentralTendency::Mean
    }
}

/// Parse an optional detrend name, where "none" (or an empty string) disables it
pub fn parse_detrend(s: &str) -> Result<Option<Detrend>, SpectralError> {
    match s {
        "" | "none" | "None" => Ok(None),
        other => other.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        assert_eq!("csd".parse::<Output>().unwrap(), Output::Csd);
        assert_eq!("chronux".parse::<Scaling>().unwrap(), Scaling::Chronux);
        assert_eq!(Normalization::Wonambi.to_string(), "wonambi");
        assert_eq!(MethodName::Stft.as_str(), "stft");
    }

    #[test]
    fn test_unsupported_value_is_rejected() {
        let err = "mode".parse::<CentralTendency>().unwrap_err();
        match err {
            SpectralError::InvalidParameter { name, reason } => {
                assert_eq!(name, "centend");
                assert!(reason.contains("mean, median"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!("psd".parse::<Output>().is_err());
    }

    #[test]
    fn test_parse_detrend() {
        assert_eq!(parse_detrend("none").unwrap(), None);
        assert_eq!(parse_detrend("linear").unwrap(), Some(Detrend::Linear));
        assert!(parse_detrend("quadratic").is_err());
    }
}
