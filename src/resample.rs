//! # Sample-rate conversion by an integer factor
//!
//! A [`RateConversionEngine`] produces a baseband signal at `L` times its sample rate by one of
//! three methods:
//! - [`InterpolationMethod::Direct`] regenerates the pulse at the higher rate and synthesizes the
//!   baseband signal again. Its output is the reference for the other methods.
//! - [`InterpolationMethod::Fir`] inserts `L - 1` zeros between samples and applies a long
//!   lowpass filter with cutoff at `1/L` of the Nyquist frequency and gain `L`.
//! - [`InterpolationMethod::ReducedTap`] does the same with a much shorter filter.
//!
//! Filter outputs are shifted back by the filter's group delay and truncated or zero-padded to
//! the length of the reference, so that all three outputs are aligned sample for sample.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use adtx::{baseband, pulse, sequencer, BitSequence, ModParams, ModulationCodebook};
//! use adtx::{PulseParams, PulseShape, RateConversionEngine};
//!
//! let codebook = Arc::new(ModulationCodebook::new(&ModParams::default())?);
//! let bits = Arc::new(BitSequence::from_text("1011001110001011")?);
//! let symbols = Arc::new(sequencer::sequence_symbols(bits, codebook)?);
//! let pulse_params = PulseParams::new(PulseShape::RaisedCosine { roll_off: 0.5 }, 8);
//! let pulse = Arc::new(pulse::generate(&pulse_params, 100, 2400)?);
//! let signal = Arc::new(baseband::synthesize(pulse, symbols, 2400, 100)?);
//!
//! let engine = RateConversionEngine::from_rates(2400, 9600)?;
//! let comparison = engine.compare(&signal)?;
//! assert_eq!(comparison.reference.samples().len(), 4 * signal.samples().len());
//! assert!(comparison.fir_stats.relative_db < -40.0);
//! assert!(comparison.reduced_tap_stats.max_abs > comparison.fir_stats.max_abs);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::{baseband, filter, utils, BasebandSignal, Error, Window};

/// Enumeration of methods for producing a baseband signal at a higher sample rate
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum InterpolationMethod {
    /// Synthesis at the higher rate (reference)
    Direct,
    /// Zero-stuffing followed by a long lowpass FIR filter
    Fir,
    /// Zero-stuffing followed by a short lowpass FIR filter
    ReducedTap,
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpolationMethod::Direct => write!(f, "Direct"),
            InterpolationMethod::Fir => write!(f, "FIR"),
            InterpolationMethod::ReducedTap => write!(f, "Reduced-tap"),
        }
    }
}

/// Length and window of an interpolation filter
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct FilterSpec {
    /// Number of taps per phase; the filter has `taps_per_phase * L + 1` taps
    pub taps_per_phase: usize,
    /// Window used in the filter design
    pub window: Window,
}

impl FilterSpec {
    /// Returns specification of the long filter (`20 * L + 1` taps, Kaiser window with `beta` 8.6).
    #[must_use]
    pub fn full() -> Self {
        Self {
            taps_per_phase: 20,
            window: Window::Kaiser { beta: 8.6 },
        }
    }

    /// Returns specification of the short filter (`2 * L + 1` taps, Hamming window).
    #[must_use]
    pub fn reduced() -> Self {
        Self {
            taps_per_phase: 2,
            window: Window::Hamming,
        }
    }

    /// Returns the number of taps for the given upsampling factor.
    #[must_use]
    pub fn num_taps(&self, factor: usize) -> usize {
        self.taps_per_phase * factor + 1
    }

    /// Returns taps of the interpolation filter for the given upsampling factor, with gain
    /// `factor` at zero frequency.
    ///
    /// # Errors
    ///
    /// Returns an error if `factor` is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn design(&self, factor: usize) -> Result<Vec<f64>, Error> {
        check_factor(factor)?;
        let gain = factor as f64;
        let mut taps = filter::lowpass(self.num_taps(factor), 1.0 / gain, self.window)?;
        for tap in &mut taps {
            *tap *= gain;
        }
        Ok(taps)
    }
}

/// Checks that the upsampling factor is positive.
fn check_factor(factor: usize) -> Result<(), Error> {
    if factor == 0 {
        return Err(Error::NonIntegerFactor(
            "Upsampling factor must be a positive integer (found 0)".to_string(),
        ));
    }
    Ok(())
}

/// Baseband signal produced at a higher sample rate
#[derive(Clone, PartialEq, Debug)]
pub struct InterpolatedSignal {
    /// Complex samples
    samples: Vec<Complex64>,
    /// Sample rate (samples per second)
    sample_rate: u32,
    /// Symbol rate (symbols per second)
    symbol_rate: u32,
    /// Method the signal was produced by
    method: InterpolationMethod,
    /// Group delay (samples) removed from the filter output, zero for direct synthesis
    group_delay: usize,
    /// Baseband signal at the lower rate
    source: Arc<BasebandSignal>,
}

impl InterpolatedSignal {
    /// Returns the complex samples.
    #[must_use]
    pub fn samples(&self) -> &[Complex64] {
        &self.samples
    }

    /// Returns the sample rate.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the symbol rate.
    #[must_use]
    pub fn symbol_rate(&self) -> u32 {
        self.symbol_rate
    }

    /// Returns the method the signal was produced by.
    #[must_use]
    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Returns the group delay removed from the filter output.
    #[must_use]
    pub fn group_delay(&self) -> usize {
        self.group_delay
    }

    /// Returns the baseband signal at the lower rate.
    #[must_use]
    pub fn source(&self) -> &Arc<BasebandSignal> {
        &self.source
    }

    /// Returns a descriptive label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({} samples/s)", self.method, self.sample_rate)
    }
}

/// Summary of the difference between a candidate signal and the reference signal
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct ResidualStats {
    /// Largest magnitude of the difference
    pub max_abs: f64,
    /// Root-mean-square magnitude of the difference
    pub rms: f64,
    /// Largest magnitude relative to the peak magnitude of the reference (dB), negative infinity
    /// if the signals are identical
    pub relative_db: f64,
}

impl ResidualStats {
    /// Returns statistics of the residual relative to the reference peak magnitude.
    #[must_use]
    pub fn new(residual: &[Complex64], reference_peak: f64) -> Self {
        let max_abs = utils::peak_magnitude(residual);
        Self {
            max_abs,
            rms: utils::mean_power(residual).sqrt(),
            relative_db: utils::amplitude_db(max_abs, reference_peak),
        }
    }
}

/// Returns the elementwise difference `reference - candidate`, over the length of the shorter
/// of the two.
#[must_use]
pub fn residual(reference: &[Complex64], candidate: &[Complex64]) -> Vec<Complex64> {
    reference
        .iter()
        .zip(candidate)
        .map(|(r, c)| r - c)
        .collect()
}

/// Outputs of all three methods, with residual statistics of the filtering methods
#[derive(Clone, PartialEq, Debug)]
pub struct RateComparison {
    /// Output of direct synthesis
    pub reference: InterpolatedSignal,
    /// Output of FIR interpolation
    pub fir: InterpolatedSignal,
    /// Output of reduced-tap interpolation
    pub reduced_tap: InterpolatedSignal,
    /// Residual statistics of FIR interpolation
    pub fir_stats: ResidualStats,
    /// Residual statistics of reduced-tap interpolation
    pub reduced_tap_stats: ResidualStats,
}

/// Engine producing baseband signals at an integer multiple of their sample rate
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct RateConversionEngine {
    /// Upsampling factor
    factor: usize,
    /// Specification of the filter for [`InterpolationMethod::Fir`]
    full: FilterSpec,
    /// Specification of the filter for [`InterpolationMethod::ReducedTap`]
    reduced: FilterSpec,
}

impl RateConversionEngine {
    /// Returns engine for the given upsampling factor, with default filters.
    ///
    /// # Errors
    ///
    /// Returns an error if `factor` is zero.
    pub fn new(factor: usize) -> Result<Self, Error> {
        check_factor(factor)?;
        Ok(Self {
            factor,
            full: FilterSpec::full(),
            reduced: FilterSpec::reduced(),
        })
    }

    /// Returns engine converting from `internal_rate` to `target_rate`, with default filters.
    ///
    /// # Errors
    ///
    /// Returns an error if `target_rate` is not a positive integer multiple of `internal_rate`.
    pub fn from_rates(internal_rate: u32, target_rate: u32) -> Result<Self, Error> {
        if internal_rate == 0 || target_rate == 0 || target_rate % internal_rate != 0 {
            return Err(Error::NonIntegerFactor(format!(
                "Target rate {target_rate} is not a positive integer multiple of internal rate \
                 {internal_rate}"
            )));
        }
        Self::new((target_rate / internal_rate) as usize)
    }

    /// Returns engine with the given filter specifications.
    #[must_use]
    pub fn with_filters(self, full: FilterSpec, reduced: FilterSpec) -> Self {
        Self {
            full,
            reduced,
            ..self
        }
    }

    /// Returns the upsampling factor.
    #[must_use]
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Returns the filter specification for the given method (`None` for direct synthesis).
    #[must_use]
    pub fn filter_spec(&self, method: InterpolationMethod) -> Option<FilterSpec> {
        match method {
            InterpolationMethod::Direct => None,
            InterpolationMethod::Fir => Some(self.full),
            InterpolationMethod::ReducedTap => Some(self.reduced),
        }
    }

    /// Returns the sample rate after upsampling from the given rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the result does not fit in a `u32`.
    pub fn target_rate(&self, internal_rate: u32) -> Result<u32, Error> {
        u32::try_from(self.factor)
            .ok()
            .and_then(|factor| internal_rate.checked_mul(factor))
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "Sample rate {internal_rate} times {} is too large",
                    self.factor
                ))
            })
    }

    /// Returns the baseband signal produced at the higher rate by the given method.
    ///
    /// # Parameters
    ///
    /// - `signal`: Baseband signal at the lower rate.
    ///
    /// - `method`: Interpolation method.
    ///
    /// # Returns
    ///
    /// - `interpolated`: Signal with `L` times as many samples as `signal`, at `L` times its
    ///   sample rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the higher rate overflows, or if the group delay of the filter exceeds
    /// the length of the zero-stuffed signal.
    pub fn interpolate(
        &self,
        signal: &Arc<BasebandSignal>,
        method: InterpolationMethod,
    ) -> Result<InterpolatedSignal, Error> {
        let interpolated = match self.filter_spec(method) {
            None => self.direct(signal)?,
            Some(spec) => self.filtered(signal, spec, method)?,
        };
        tracing::debug!(
            %method,
            factor = self.factor,
            group_delay = interpolated.group_delay,
            num_samples = interpolated.samples.len(),
            "Interpolated baseband signal"
        );
        Ok(interpolated)
    }

    /// Returns the signal synthesized at the higher rate.
    fn direct(&self, signal: &Arc<BasebandSignal>) -> Result<InterpolatedSignal, Error> {
        let sample_rate = self.target_rate(signal.sample_rate())?;
        let symbol_rate = signal.symbol_rate();
        let pulse = Arc::new(signal.pulse().upsampled(self.factor)?);
        let synthesized = baseband::synthesize(
            pulse,
            Arc::clone(signal.symbols()),
            sample_rate,
            symbol_rate,
        )?;
        Ok(InterpolatedSignal {
            samples: synthesized.samples().to_vec(),
            sample_rate,
            symbol_rate,
            method: InterpolationMethod::Direct,
            group_delay: 0,
            source: Arc::clone(signal),
        })
    }

    /// Returns the signal zero-stuffed, filtered and aligned with the direct synthesis output.
    fn filtered(
        &self,
        signal: &Arc<BasebandSignal>,
        spec: FilterSpec,
        method: InterpolationMethod,
    ) -> Result<InterpolatedSignal, Error> {
        let sample_rate = self.target_rate(signal.sample_rate())?;
        let taps = spec.design(self.factor)?;
        let delay = filter::group_delay(taps.len());
        let len = signal.samples().len();
        let stuffed_len = len.saturating_sub(1) * self.factor + 1;
        if len == 0 || delay > stuffed_len {
            return Err(Error::Alignment(format!(
                "Group delay of {delay} samples exceeds zero-stuffed signal length {stuffed_len}"
            )));
        }
        let mut samples = filter::upfirdn(signal.samples(), &taps, self.factor);
        samples.drain(.. delay);
        samples.resize(len * self.factor, Complex64::new(0.0, 0.0));
        Ok(InterpolatedSignal {
            samples,
            sample_rate,
            symbol_rate: signal.symbol_rate(),
            method,
            group_delay: delay,
            source: Arc::clone(signal),
        })
    }

    /// Returns outputs of all three methods and residual statistics of the filtering methods.
    ///
    /// The three methods run on separate worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three methods fails.
    pub fn compare(&self, signal: &Arc<BasebandSignal>) -> Result<RateComparison, Error> {
        let (reference, (fir, reduced_tap)) = rayon::join(
            || self.interpolate(signal, InterpolationMethod::Direct),
            || {
                rayon::join(
                    || self.interpolate(signal, InterpolationMethod::Fir),
                    || self.interpolate(signal, InterpolationMethod::ReducedTap),
                )
            },
        );
        let (reference, fir, reduced_tap) = (reference?, fir?, reduced_tap?);
        let peak = utils::peak_magnitude(reference.samples());
        let fir_stats = ResidualStats::new(&residual(reference.samples(), fir.samples()), peak);
        let reduced_tap_stats =
            ResidualStats::new(&residual(reference.samples(), reduced_tap.samples()), peak);
        tracing::debug!(
            fir_max_abs = fir_stats.max_abs,
            fir_relative_db = fir_stats.relative_db,
            reduced_tap_max_abs = reduced_tap_stats.max_abs,
            reduced_tap_relative_db = reduced_tap_stats.relative_db,
            "Computed residuals"
        );
        Ok(RateComparison {
            reference,
            fir,
            reduced_tap,
            fir_stats,
            reduced_tap_stats,
        })
    }
}


#[cfg(test)]
mod tests_of_functions {
    use super::*;

    #[test]
    fn test_residual() {
        let reference = [Complex64::new(1.0, 2.0), Complex64::new(-1.0, 0.5)];
        let candidate = [
            Complex64::new(0.5, 2.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(9.0, 9.0),
        ];
        assert_eq!(
            residual(&reference, &candidate),
            [Complex64::new(0.5, 0.0), Complex64::new(0.0, 0.5)]
        );
        assert!(residual(&[], &candidate).is_empty());
    }

    #[test]
    fn test_residual_stats() {
        let residual = [Complex64::new(0.3, 0.4), Complex64::new(0.0, 0.0)];
        let stats = ResidualStats::new(&residual, 50.0);
        assert!((stats.max_abs - 0.5).abs() < 1e-12);
        assert!((stats.rms - 0.125f64.sqrt()).abs() < 1e-12);
        assert!((stats.relative_db + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        assert_eq!(InterpolationMethod::Direct.to_string(), "Direct");
        assert_eq!(InterpolationMethod::Fir.to_string(), "FIR");
        assert_eq!(InterpolationMethod::ReducedTap.to_string(), "Reduced-tap");
    }
}
