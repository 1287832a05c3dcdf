//! This crate implements the signal chain of a digital transmitter for teaching purposes: a bit
//! sequence is grouped into symbols, mapped onto an amplitude- or phase-shift-keying codebook,
//! shaped by a pulse, synthesized into a complex baseband signal and finally up-converted to a
//! real passband waveform in the audio range. The same baseband content can also be produced at
//! a higher sample rate by direct synthesis, by FIR interpolation or by reduced-tap
//! interpolation, and the residual error between these methods can be analyzed.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use adtx::{
//!     baseband, codebook, pulse, quadrature, sequencer, BitMapper, BitSequence,
//!     ModParams, ModulationScheme, PulseParams, PulseShape,
//! };
//!
//! let bits = Arc::new(BitSequence::from_text("10110100")?);
//! let mod_params = ModParams::new(ModulationScheme::AmplitudeShiftKeying, 2, BitMapper::Identity);
//! let codebook = Arc::new(codebook::ModulationCodebook::new(&mod_params)?);
//! let symbols = Arc::new(sequencer::sequence_symbols(bits, codebook)?);
//! let pulse_params = PulseParams::new(PulseShape::Rectangular, 1);
//! let pulse = Arc::new(pulse::generate(&pulse_params, 100, 400)?);
//! let baseband = Arc::new(baseband::synthesize(pulse, symbols, 400, 100)?);
//! let passband = quadrature::modulate(baseband, 50)?;
//! assert_eq!(passband.samples().len(), 32);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

pub mod baseband;
pub mod bits;
pub mod chain;
pub mod codebook;
pub mod filter;
pub mod mapper;
pub mod pulse;
pub mod quadrature;
pub mod resample;
pub mod sequencer;
pub mod utils;

pub use baseband::{BasebandSignal, SynthesisCursor, SynthesisStep};
pub use bits::BitSequence;
pub use chain::{
    ChainController, ChainParams, ChainState, ComparisonReport, ExportMetadata, MethodReport,
    ParamChange,
};
pub use codebook::{ModParams, ModulationCodebook, ModulationScheme};
pub use filter::Window;
pub use mapper::BitMapper;
pub use num_complex::Complex64;
pub use pulse::{PulseParams, PulseShape, PulseWaveform};
pub use quadrature::PassbandSignal;
pub use resample::{
    FilterSpec, InterpolatedSignal, InterpolationMethod, RateComparison, RateConversionEngine,
    ResidualStats,
};
pub use sequencer::SymbolSequence;

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid parameter error (cardinality, roll-off, span, rates, carrier)
    #[error("{0}")]
    InvalidParameter(String),
    /// Input too short, or lengths of inputs passed together do not agree
    #[error("{0}")]
    LengthMismatch(String),
    /// Pulse and caller disagree on sample rate or symbol rate
    #[error("{0}")]
    MismatchedRate(String),
    /// Upsampling factor is not a positive integer
    #[error("{0}")]
    NonIntegerFactor(String),
    /// Group delay of a filter cannot be compensated for the given signal
    #[error("{0}")]
    Alignment(String),
    /// Bit text contains characters other than `0` and `1`
    #[error("{0}")]
    InvalidBitText(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWrite(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWrite(#[from] serde_json::Error),
}

/// Enumeration of binary symbol values
#[derive(Clone, Eq, PartialEq, Hash, Debug, Copy)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl Bit {
    /// Returns the bit as an integer (`0` or `1`).
    #[must_use]
    pub fn value(self) -> usize {
        match self {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }

    /// Returns the bit with the given integer value, if the value is `0` or `1`.
    #[must_use]
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Bit::Zero),
            1 => Some(Bit::One),
            _ => None,
        }
    }
}

impl std::fmt::Display for Bit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests_of_bit {
    use super::*;

    #[test]
    fn test_value() {
        assert_eq!(Bit::Zero.value(), 0);
        assert_eq!(Bit::One.value(), 1);
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Bit::from_value(0), Some(Bit::Zero));
        assert_eq!(Bit::from_value(1), Some(Bit::One));
        assert_eq!(Bit::from_value(2), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}{}", Bit::One, Bit::Zero), "10");
    }
}
