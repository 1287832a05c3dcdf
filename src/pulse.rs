//! Sampled pulse shapes
//!
//! All pulses are sampled on the grid `t_n = (n - c) / fs` for `n` in `0 .. N`, where
//! `N = span * samples_per_symbol` and `c` is the center index, so that `t = 0` always falls on a
//! sample. [`generate`] puts the center at `N/2` rounded down. [`PulseWaveform::upsampled`] puts
//! it at `L * c`, so that the pulse at `L` times the sample rate contains the base-rate pulse as
//! every `L`-th sample, whatever the parity of `N`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Tolerance (relative to samples per symbol) for locating the raised-cosine singular points
const SINGULARITY_TOL: f64 = 1e-9;

/// Enumeration of pulse shapes
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum PulseShape {
    /// Unity amplitude for one symbol period, centered in the span
    Rectangular,
    /// `cos^2(pi*t / (2*Ts))` for `|t| <= Ts`, zero elsewhere
    CosineSquared,
    /// Raised-cosine pulse with given roll-off factor in `(0, 1]`
    RaisedCosine {
        /// Roll-off factor
        roll_off: f64,
    },
}

impl PulseShape {
    /// Returns the name of the variant.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PulseShape::Rectangular => "Rectangle",
            PulseShape::CosineSquared => "Cosine-Squared",
            PulseShape::RaisedCosine { .. } => "Raised-Cosine",
        }
    }

    /// Returns the roll-off factor for a raised-cosine pulse, and `None` for other shapes.
    #[must_use]
    pub fn roll_off(&self) -> Option<f64> {
        match self {
            PulseShape::RaisedCosine { roll_off } => Some(*roll_off),
            _ => None,
        }
    }
}

impl std::fmt::Display for PulseShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.roll_off() {
            Some(roll_off) => write!(f, "{} (roll-off {roll_off})", self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Parameters selecting a pulse
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct PulseParams {
    /// Pulse shape
    pub shape: PulseShape,
    /// Number of symbol periods occupied by the pulse
    pub span: usize,
}

impl PulseParams {
    /// Returns pulse parameters with the given fields.
    #[must_use]
    pub fn new(shape: PulseShape, span: usize) -> Self {
        Self { shape, span }
    }

    /// Checks validity of the parameters (span and roll-off).
    ///
    /// # Errors
    ///
    /// Returns an error if `span` is `0`, or if the roll-off of a raised-cosine pulse is not in
    /// `(0, 1]`.
    pub fn validate(&self) -> Result<(), Error> {
        if self.span == 0 {
            return Err(Error::InvalidParameter(
                "Pulse span must be at least one symbol period".to_string(),
            ));
        }
        if let Some(roll_off) = self.shape.roll_off() {
            if !(roll_off > 0.0 && roll_off <= 1.0) {
                return Err(Error::InvalidParameter(format!(
                    "Roll-off factor must be in (0, 1] (found {roll_off})"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PulseParams {
    fn default() -> Self {
        Self::new(PulseShape::Rectangular, 2)
    }
}

/// Sampled finite-support pulse
#[derive(Clone, PartialEq, Debug)]
pub struct PulseWaveform {
    /// Parameters the pulse was generated from
    params: PulseParams,
    /// Pulse samples
    samples: Vec<f64>,
    /// Symbol rate (symbols per second)
    symbol_rate: u32,
    /// Sample rate (samples per second)
    sample_rate: u32,
    /// Number of samples per symbol period
    samples_per_symbol: usize,
    /// Index of the sample at `t = 0`
    center_index: usize,
}

impl PulseWaveform {
    /// Returns the pulse samples.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the parameters the pulse was generated from.
    #[must_use]
    pub fn params(&self) -> &PulseParams {
        &self.params
    }

    /// Returns the symbol rate.
    #[must_use]
    pub fn symbol_rate(&self) -> u32 {
        self.symbol_rate
    }

    /// Returns the sample rate.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of samples per symbol period.
    #[must_use]
    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Returns the span in symbol periods.
    #[must_use]
    pub fn span(&self) -> usize {
        self.params.span
    }

    /// Returns the index of the sample at `t = 0`.
    #[must_use]
    pub fn center_index(&self) -> usize {
        self.center_index
    }

    /// Returns the same pulse sampled at `factor` times the sample rate.
    ///
    /// The center of the returned pulse is `factor` times the center of this one, so every
    /// `factor`-th sample of it coincides with a sample of this pulse.
    ///
    /// # Errors
    ///
    /// Returns an error if `factor` is zero or if the higher sample rate overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use adtx::{pulse, PulseParams, PulseShape};
    ///
    /// let params = PulseParams::new(PulseShape::RaisedCosine { roll_off: 0.5 }, 3);
    /// let rc = pulse::generate(&params, 100, 500)?;
    /// let fast = rc.upsampled(2)?;
    /// assert_eq!(rc.center_index(), 7);
    /// assert_eq!(fast.center_index(), 14);
    /// assert_eq!(fast.samples()[fast.center_index()], 1.0);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn upsampled(&self, factor: usize) -> Result<Self, Error> {
        let sample_rate = u32::try_from(factor)
            .ok()
            .filter(|&factor| factor > 0)
            .and_then(|factor| self.sample_rate.checked_mul(factor))
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "Cannot upsample pulse at {} samples/s by factor {factor}",
                    self.sample_rate
                ))
            })?;
        sampled(
            &self.params,
            self.symbol_rate,
            sample_rate,
            |num_samples| self.center_index * num_samples / self.samples.len(),
        )
    }
}

/// Returns number of samples per symbol for given rates.
///
/// # Errors
///
/// Returns an error if either rate is zero, or if `sample_rate` is not an integer multiple of
/// `symbol_rate`.
pub fn samples_per_symbol(symbol_rate: u32, sample_rate: u32) -> Result<usize, Error> {
    if symbol_rate == 0 || sample_rate == 0 {
        return Err(Error::InvalidParameter(format!(
            "Symbol rate and sample rate must be positive (found {symbol_rate} and {sample_rate})"
        )));
    }
    if sample_rate % symbol_rate != 0 {
        return Err(Error::InvalidParameter(format!(
            "Sample rate {sample_rate} is not an integer multiple of symbol rate {symbol_rate}"
        )));
    }
    Ok((sample_rate / symbol_rate) as usize)
}

/// Returns pulse waveform for given parameters and rates.
///
/// # Parameters
///
/// - `params`: Pulse shape and span.
///
/// - `symbol_rate`: Symbol rate (symbols per second).
///
/// - `sample_rate`: Sample rate (samples per second). Must be an integer multiple of
///   `symbol_rate`.
///
/// # Returns
///
/// - `pulse`: Pulse with `span * sample_rate / symbol_rate` samples. For a raised-cosine pulse,
///   the sample at `t = 0` is exactly `1.0`, and samples at `t = +/- Ts / (2 * roll_off)` are
///   exactly `0.0`.
///
/// # Errors
///
/// Returns an error if `params` is invalid or if the rates are incompatible.
///
/// # Examples
///
/// ```
/// use adtx::{pulse, PulseParams, PulseShape};
///
/// let params = PulseParams::new(PulseShape::RaisedCosine { roll_off: 0.5 }, 4);
/// let rc = pulse::generate(&params, 100, 800)?;
/// assert_eq!(rc.samples().len(), 32);
/// assert_eq!(rc.samples()[rc.center_index()], 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn generate(
    params: &PulseParams,
    symbol_rate: u32,
    sample_rate: u32,
) -> Result<PulseWaveform, Error> {
    sampled(params, symbol_rate, sample_rate, |num_samples| num_samples / 2)
}

/// Returns pulse waveform with the center index given as a function of the number of samples.
fn sampled<F>(
    params: &PulseParams,
    symbol_rate: u32,
    sample_rate: u32,
    center_of: F,
) -> Result<PulseWaveform, Error>
where
    F: FnOnce(usize) -> usize,
{
    params.validate()?;
    let sps = samples_per_symbol(symbol_rate, sample_rate)?;
    let num_samples = params.span * sps;
    let center = center_of(num_samples);
    let samples = match params.shape {
        PulseShape::Rectangular => rectangular(num_samples, sps, center),
        PulseShape::CosineSquared => cosine_squared(num_samples, sps, center),
        PulseShape::RaisedCosine { roll_off } => {
            raised_cosine(num_samples, sps, center, roll_off)
        }
    };
    tracing::debug!(
        shape = %params.shape,
        span = params.span,
        samples_per_symbol = sps,
        center,
        "Generated pulse"
    );
    Ok(PulseWaveform {
        params: *params,
        samples,
        symbol_rate,
        sample_rate,
        samples_per_symbol: sps,
        center_index: center,
    })
}

/// Returns offsets `n - center` of all samples, in units of samples.
#[allow(clippy::cast_possible_wrap)]
fn sample_offsets(num_samples: usize, center: usize) -> impl Iterator<Item = i64> {
    let center = center as i64;
    (0 .. num_samples as i64).map(move |n| n - center)
}

/// Returns rectangular pulse samples, one for offsets in `-sps/2 .. sps - sps/2`.
#[allow(clippy::cast_possible_wrap)]
fn rectangular(num_samples: usize, sps: usize, center: usize) -> Vec<f64> {
    let first = -((sps / 2) as i64);
    let end = first + sps as i64;
    sample_offsets(num_samples, center)
        .map(|offset| if (first .. end).contains(&offset) { 1.0 } else { 0.0 })
        .collect()
}

/// Returns cosine-squared pulse samples.
#[allow(clippy::cast_precision_loss)]
fn cosine_squared(num_samples: usize, sps: usize, center: usize) -> Vec<f64> {
    sample_offsets(num_samples, center)
        .map(|offset| {
            if offset.unsigned_abs() as usize <= sps {
                let t_norm = offset as f64 / sps as f64;
                (PI * t_norm / 2.0).cos().powi(2)
            } else {
                0.0
            }
        })
        .collect()
}

/// Returns raised-cosine pulse samples.
#[allow(clippy::cast_precision_loss)]
fn raised_cosine(num_samples: usize, sps: usize, center: usize, roll_off: f64) -> Vec<f64> {
    let sps_f = sps as f64;
    sample_offsets(num_samples, center)
        .map(|offset| {
            if offset == 0 {
                return 1.0;
            }
            let offset_f = offset as f64;
            if ((2.0 * roll_off * offset_f).abs() - sps_f).abs() < SINGULARITY_TOL * sps_f {
                return 0.0;
            }
            let t_norm = offset_f / sps_f;
            let numerator = (PI * t_norm).sin() * (PI * roll_off * t_norm).cos();
            let denominator = PI * t_norm * (1.0 - (2.0 * roll_off * t_norm).powi(2));
            numerator / denominator
        })
        .collect()
}

#[cfg(test)]
mod tests_of_functions {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_validate() {
        // Invalid input
        assert!(PulseParams::new(PulseShape::Rectangular, 0).validate().is_err());
        for roll_off in [0.0, -0.2, 1.01, f64::NAN] {
            let params = PulseParams::new(PulseShape::RaisedCosine { roll_off }, 4);
            assert!(params.validate().is_err());
        }
        // Valid input
        assert!(PulseParams::new(PulseShape::CosineSquared, 1).validate().is_ok());
        for roll_off in [0.01, 0.5, 1.0] {
            let params = PulseParams::new(PulseShape::RaisedCosine { roll_off }, 4);
            assert!(params.validate().is_ok());
        }
    }

    #[test]
    fn test_samples_per_symbol() {
        // Invalid input
        assert!(samples_per_symbol(0, 48000).is_err());
        assert!(samples_per_symbol(100, 0).is_err());
        assert!(samples_per_symbol(300, 44100 + 1).is_err());
        assert!(samples_per_symbol(400, 1000).is_err());
        // Valid input
        assert_eq!(samples_per_symbol(100, 48000).unwrap(), 480);
        assert_eq!(samples_per_symbol(1, 1).unwrap(), 1);
    }

    #[test]
    fn test_generate() {
        // Invalid input
        let params = PulseParams::new(PulseShape::Rectangular, 2);
        assert!(generate(&params, 3, 10).is_err());
        let params = PulseParams::new(PulseShape::RaisedCosine { roll_off: 1.5 }, 2);
        assert!(generate(&params, 1, 10).is_err());
        // Valid input
        for (shape, span) in [
            (PulseShape::Rectangular, 1),
            (PulseShape::Rectangular, 3),
            (PulseShape::CosineSquared, 2),
            (PulseShape::RaisedCosine { roll_off: 0.3 }, 7),
        ] {
            let pulse = generate(&PulseParams::new(shape, span), 50, 1000).unwrap();
            assert_eq!(pulse.samples().len(), span * 20);
            assert_eq!(pulse.samples_per_symbol(), 20);
            assert_eq!(pulse.span(), span);
            assert_eq!(pulse.symbol_rate(), 50);
            assert_eq!(pulse.sample_rate(), 1000);
            assert!(pulse.samples().iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    fn test_rectangular() {
        assert_eq!(rectangular(4, 4, 2), [1.0; 4]);
        assert_eq!(rectangular(8, 4, 4), [0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(rectangular(9, 3, 4), [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        // Block of an odd number of samples is symmetric about the center
        assert_eq!(rectangular(6, 3, 3), [0.0, 0.0, 1.0, 1.0, 1.0, 0.0]);
        // Block is clipped at the ends of the span
        assert_eq!(rectangular(6, 6, 2), [1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_cosine_squared() {
        let pulse = cosine_squared(8, 2, 4);
        // Offsets -4 ..= 3 samples, i.e. t/Ts from -2.0 to 1.5 in steps of 0.5
        assert_float_eq!(
            pulse,
            vec![0.0, 0.0, 0.0, 0.5, 1.0, 0.5, 0.0, 0.0],
            abs_all <= 1e-12
        );
    }

    #[test]
    fn test_raised_cosine() {
        // Peak at t = 0 is exactly one, zero crossings at non-zero multiples of Ts
        for roll_off in [0.1, 0.2, 0.35, 0.5, 0.9, 1.0] {
            let pulse = raised_cosine(64, 8, 32, roll_off);
            assert_eq!(pulse[32], 1.0);
            for k in [8, 16, 24] {
                assert_float_eq!(pulse[32 + k], 0.0, abs <= 1e-12);
                assert_float_eq!(pulse[32 - k], 0.0, abs <= 1e-12);
            }
            assert!(pulse.iter().all(|x| x.is_finite()));
            // Symmetric about the center
            for k in 1 .. 32 {
                assert_float_eq!(pulse[32 + k], pulse[32 - k], abs <= 1e-12);
            }
        }
    }

    #[test]
    fn test_raised_cosine_singular_points() {
        // With roll-off 0.25 and 8 samples per symbol, t = +/- Ts / (2 * roll_off) = +/- 2 Ts
        // falls on offsets +/- 16 samples
        let pulse = raised_cosine(64, 8, 32, 0.25);
        assert_eq!(pulse[32 + 16], 0.0);
        assert_eq!(pulse[32 - 16], 0.0);
        // With roll-off 0.8 and 8 samples per symbol, the singular points are at +/- 5 samples
        let pulse = raised_cosine(32, 8, 16, 0.8);
        assert_eq!(pulse[16 + 5], 0.0);
        assert_eq!(pulse[16 - 5], 0.0);
        assert!(pulse.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_pulse_at_multiple_rates() {
        // The pulse at four times the rate contains the base-rate pulse as every fourth sample
        let params = PulseParams::new(PulseShape::RaisedCosine { roll_off: 0.35 }, 6);
        let base = generate(&params, 100, 1200).unwrap();
        let fast = generate(&params, 100, 4800).unwrap();
        let decimated: Vec<f64> = fast.samples().iter().step_by(4).copied().collect();
        assert_float_eq!(decimated, base.samples().to_vec(), abs_all <= 1e-12);
        assert_eq!(fast, base.upsampled(4).unwrap());
    }

    #[test]
    fn test_upsampled() {
        // Invalid input
        let params = PulseParams::new(PulseShape::CosineSquared, 3);
        let base = generate(&params, 100, 500).unwrap();
        assert!(base.upsampled(0).is_err());
        assert!(base.upsampled(usize::MAX).is_err());
        // Odd pulse length: every shape keeps its center on the base grid at even factors
        for shape in [
            PulseShape::Rectangular,
            PulseShape::CosineSquared,
            PulseShape::RaisedCosine { roll_off: 0.5 },
        ] {
            for (span, symbol_rate, sample_rate) in [(3, 100, 500), (9, 100, 2500), (7, 4, 100)] {
                let base = generate(&PulseParams::new(shape, span), symbol_rate, sample_rate)
                    .unwrap();
                assert_eq!(base.samples().len() % 2, 1);
                for factor in [1, 2, 4] {
                    let fast = base.upsampled(factor).unwrap();
                    assert_eq!(fast.samples().len(), factor * base.samples().len());
                    assert_eq!(fast.sample_rate(), sample_rate * factor as u32);
                    assert_eq!(fast.center_index(), factor * base.center_index());
                    if shape != PulseShape::Rectangular {
                        let decimated: Vec<f64> =
                            fast.samples().iter().step_by(factor).copied().collect();
                        assert_float_eq!(decimated, base.samples().to_vec(), abs_all <= 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(PulseShape::Rectangular.to_string(), "Rectangle");
        assert_eq!(
            PulseShape::RaisedCosine { roll_off: 0.5 }.to_string(),
            "Raised-Cosine (roll-off 0.5)"
        );
    }
}
