//! # Quadrature up-conversion and down-conversion
//!
//! The [`modulate`] function turns a complex baseband signal `b[n]` into the real passband
//! signal `sqrt(2) * Re{b[n] * exp(j*2*pi*fc*n/fs)}`, which has the same power as the baseband
//! signal. The [`mix_down`] function multiplies a passband signal by `sqrt(2) * exp(-j*2*pi*fc*n/fs)`,
//! which restores the baseband signal plus an image at twice the carrier frequency; the
//! [`demodulate`] function follows the mixer with a lowpass filter that removes the image and
//! compensates the filter's group delay.

use std::f64::consts::{PI, SQRT_2};
use std::sync::Arc;

use num_complex::Complex64;

use crate::{filter, BasebandSignal, Error, Window};

/// Real passband signal
#[derive(Clone, PartialEq, Debug)]
pub struct PassbandSignal {
    /// Real samples
    samples: Vec<f64>,
    /// Sample rate (samples per second)
    sample_rate: u32,
    /// Carrier frequency (Hz)
    carrier: u32,
    /// Baseband signal the passband signal was modulated from
    baseband: Arc<BasebandSignal>,
}

impl PassbandSignal {
    /// Returns the real samples.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the sample rate.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the carrier frequency.
    #[must_use]
    pub fn carrier(&self) -> u32 {
        self.carrier
    }

    /// Returns the baseband signal the passband signal was modulated from.
    #[must_use]
    pub fn baseband(&self) -> &Arc<BasebandSignal> {
        &self.baseband
    }

    /// Returns a descriptive label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Passband ({} Hz carrier)", self.carrier)
    }

    /// Returns the baseband signal recovered by [`demodulate`].
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`demodulate`].
    pub fn demodulate(&self, num_taps: usize, window: Window) -> Result<Vec<Complex64>, Error> {
        demodulate(
            &self.samples,
            self.carrier,
            self.sample_rate,
            num_taps,
            window,
        )
    }
}

/// Checks that the carrier is positive and below the Nyquist frequency.
fn check_carrier(carrier: u32, sample_rate: u32) -> Result<(), Error> {
    if carrier == 0 || 2 * u64::from(carrier) >= u64::from(sample_rate) {
        return Err(Error::InvalidParameter(format!(
            "Carrier frequency must be positive and below half the sample rate (found {carrier} Hz \
             at {sample_rate} samples/s)"
        )));
    }
    Ok(())
}

/// Returns the carrier phase `2*pi*fc*n/fs` at sample `n`, reduced modulo one period.
#[allow(clippy::cast_precision_loss)]
fn carrier_phase(carrier: u32, sample_rate: u32, n: usize) -> f64 {
    let cycles = (u64::from(carrier) * n as u64) % u64::from(sample_rate);
    2.0 * PI * cycles as f64 / f64::from(sample_rate)
}

/// Returns passband signal for given baseband signal and carrier frequency.
///
/// # Parameters
///
/// - `baseband`: Baseband signal. Its sample rate is also the passband sample rate.
///
/// - `carrier`: Carrier frequency (Hz). Must be positive and below half the sample rate.
///
/// # Returns
///
/// - `passband`: Passband signal with as many samples as `baseband`, with the carrier phase
///   equal to zero at the first sample.
///
/// # Errors
///
/// Returns an error if `carrier` is zero or not below half the sample rate.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use adtx::{baseband, pulse, quadrature, sequencer};
/// use adtx::{BitSequence, ModParams, ModulationCodebook, PulseParams, PulseShape};
///
/// let codebook = Arc::new(ModulationCodebook::new(&ModParams::default())?);
/// let symbols = Arc::new(sequencer::sequence_symbols(
///     Arc::new(BitSequence::from_text("1")?),
///     codebook,
/// )?);
/// let pulse = Arc::new(pulse::generate(&PulseParams::new(PulseShape::Rectangular, 1), 1, 8)?);
/// let signal = Arc::new(baseband::synthesize(pulse, symbols, 8, 1)?);
/// let passband = quadrature::modulate(signal, 2)?;
/// let expected = [2f64.sqrt(), 0.0, -2f64.sqrt(), 0.0];
/// for (x, y) in passband.samples().iter().zip(expected.iter().cycle()) {
///     assert!((x - y).abs() < 1e-12);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn modulate(baseband: Arc<BasebandSignal>, carrier: u32) -> Result<PassbandSignal, Error> {
    let sample_rate = baseband.sample_rate();
    check_carrier(carrier, sample_rate)?;
    let samples: Vec<f64> = baseband
        .samples()
        .iter()
        .enumerate()
        .map(|(n, b)| {
            let phase = carrier_phase(carrier, sample_rate, n);
            SQRT_2 * (b.re * phase.cos() - b.im * phase.sin())
        })
        .collect();
    tracing::debug!(
        carrier,
        sample_rate,
        num_samples = samples.len(),
        "Modulated baseband signal onto carrier"
    );
    Ok(PassbandSignal {
        samples,
        sample_rate,
        carrier,
        baseband,
    })
}

/// Returns passband samples translated back to zero frequency, without image rejection.
///
/// The output equals the baseband signal plus its conjugate shifted to twice the carrier
/// frequency.
///
/// # Errors
///
/// Returns an error if `carrier` is zero or not below half of `sample_rate`.
pub fn mix_down(samples: &[f64], carrier: u32, sample_rate: u32) -> Result<Vec<Complex64>, Error> {
    check_carrier(carrier, sample_rate)?;
    Ok(samples
        .iter()
        .enumerate()
        .map(|(n, &x)| {
            let phase = carrier_phase(carrier, sample_rate, n);
            Complex64::new(SQRT_2 * x * phase.cos(), -SQRT_2 * x * phase.sin())
        })
        .collect())
}

/// Returns baseband signal recovered from passband samples.
///
/// # Parameters
///
/// - `samples`: Passband samples.
///
/// - `carrier`: Carrier frequency (Hz).
///
/// - `sample_rate`: Sample rate (samples per second).
///
/// - `num_taps`: Number of taps of the lowpass filter removing the image at twice the carrier
///   frequency. The image lies at `min(2*fc, fs - 2*fc)` from zero frequency once aliased, and
///   the filter cutoff is halfway to it, at `min(fc, fs/2 - fc)`.
///
/// - `window`: Window used to design the lowpass filter.
///
/// # Returns
///
/// - `baseband`: Recovered baseband samples, aligned with the passband samples (the filter's
///   group delay is removed) and of the same length.
///
/// # Errors
///
/// Returns an error if `carrier` is zero or not below half of `sample_rate`, or if `num_taps` is
/// zero.
pub fn demodulate(
    samples: &[f64],
    carrier: u32,
    sample_rate: u32,
    num_taps: usize,
    window: Window,
) -> Result<Vec<Complex64>, Error> {
    let mixed = mix_down(samples, carrier, sample_rate)?;
    let image = 2.0 * f64::from(carrier) / f64::from(sample_rate);
    let cutoff = image.min(1.0 - image);
    let taps = filter::lowpass(num_taps, cutoff, window)?;
    let delay = filter::group_delay(num_taps);
    let filtered = filter::convolve(&mixed, &taps);
    Ok(filtered.into_iter().skip(delay).take(samples.len()).collect())
}

#[cfg(test)]
mod tests_of_functions {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::{
        baseband, pulse, sequencer, BitMapper, BitSequence, ModParams, ModulationCodebook,
        ModulationScheme, PulseParams, PulseShape,
    };

    fn qpsk_baseband(sample_rate: u32, symbol_rate: u32) -> Arc<BasebandSignal> {
        let params = ModParams::new(ModulationScheme::PhaseShiftKeying, 4, BitMapper::Identity);
        let codebook = Arc::new(ModulationCodebook::new(&params).unwrap());
        let bits = Arc::new(BitSequence::from_text("1011001110001011").unwrap());
        let symbols = Arc::new(sequencer::sequence_symbols(bits, codebook).unwrap());
        let pulse_params = PulseParams::new(PulseShape::RaisedCosine { roll_off: 0.5 }, 8);
        let pulse = Arc::new(pulse::generate(&pulse_params, symbol_rate, sample_rate).unwrap());
        Arc::new(baseband::synthesize(pulse, symbols, sample_rate, symbol_rate).unwrap())
    }

    #[test]
    fn test_check_carrier() {
        // Invalid input
        assert!(check_carrier(0, 48000).is_err());
        assert!(check_carrier(24000, 48000).is_err());
        assert!(check_carrier(30000, 48000).is_err());
        // Valid input
        assert!(check_carrier(1, 48000).is_ok());
        assert!(check_carrier(23999, 48000).is_ok());
    }

    #[test]
    fn test_carrier_phase() {
        assert_float_eq!(carrier_phase(440, 48000, 0), 0.0, abs <= 1e-15);
        assert_float_eq!(carrier_phase(1, 4, 1), PI / 2.0, abs <= 1e-15);
        assert_float_eq!(carrier_phase(1, 4, 5), PI / 2.0, abs <= 1e-15);
        assert_float_eq!(carrier_phase(3, 8, 1_000_001), 3.0 * PI / 4.0, abs <= 1e-15);
    }

    #[test]
    fn test_modulate() {
        let signal = qpsk_baseband(4800, 100);
        // Invalid input
        assert!(modulate(Arc::clone(&signal), 0).is_err());
        assert!(modulate(Arc::clone(&signal), 2400).is_err());
        // Valid input
        let passband = modulate(Arc::clone(&signal), 1200).unwrap();
        assert_eq!(passband.samples().len(), signal.samples().len());
        assert_eq!(passband.sample_rate(), 4800);
        assert_eq!(passband.carrier(), 1200);
        assert_eq!(passband.label(), "Passband (1200 Hz carrier)");
        // At a quarter of the sample rate the carrier is 1, j, -1, -j
        for (n, (x, b)) in passband.samples().iter().zip(signal.samples()).enumerate() {
            let expected = SQRT_2
                * match n % 4 {
                    0 => b.re,
                    1 => -b.im,
                    2 => -b.re,
                    _ => b.im,
                };
            assert_float_eq!(*x, expected, abs <= 1e-12);
        }
    }

    #[test]
    fn test_modulate_power() {
        // Passband power equals baseband power over many carrier cycles
        let signal = qpsk_baseband(4800, 100);
        let passband = modulate(Arc::clone(&signal), 1000).unwrap();
        let baseband_energy: f64 = signal.samples().iter().map(Complex64::norm_sqr).sum();
        let passband_energy: f64 = passband.samples().iter().map(|x| x * x).sum();
        assert_float_eq!(passband_energy, baseband_energy, rmax <= 0.02);
    }

    #[test]
    fn test_mix_down() {
        // Invalid input
        assert!(mix_down(&[1.0, 0.0], 0, 100).is_err());
        // Valid input: mixer output is baseband plus an image at twice the carrier
        let signal = qpsk_baseband(4800, 100);
        let passband = modulate(Arc::clone(&signal), 600).unwrap();
        let mixed = mix_down(passband.samples(), 600, 4800).unwrap();
        for (n, (y, b)) in mixed.iter().zip(signal.samples()).enumerate() {
            let image = b.conj() * Complex64::from_polar(1.0, -2.0 * carrier_phase(600, 4800, n));
            let expected = b + image;
            assert_float_eq!(y.re, expected.re, abs <= 1e-12);
            assert_float_eq!(y.im, expected.im, abs <= 1e-12);
        }
    }

    #[test]
    fn test_demodulate() {
        let signal = qpsk_baseband(4800, 100);
        let passband = modulate(Arc::clone(&signal), 1200).unwrap();
        // Invalid input
        assert!(passband.demodulate(0, Window::Hamming).is_err());
        assert!(demodulate(passband.samples(), 2400, 4800, 41, Window::Hamming).is_err());
        // Valid input
        for num_taps in [41, 101] {
            let recovered = passband
                .demodulate(num_taps, Window::Kaiser { beta: 8.6 })
                .unwrap();
            assert_eq!(recovered.len(), signal.samples().len());
            for (y, b) in recovered.iter().zip(signal.samples()) {
                assert_float_eq!(y.re, b.re, abs <= 1e-3);
                assert_float_eq!(y.im, b.im, abs <= 1e-3);
            }
        }
    }

    #[test]
    fn test_demodulate_near_nyquist() {
        // Above a quarter of the sample rate the image aliases back towards zero frequency
        let signal = qpsk_baseband(4800, 100);
        for (carrier, taps) in [(1800, [41, 101]), (2000, [41, 101]), (2200, [101, 201])] {
            let passband = modulate(Arc::clone(&signal), carrier).unwrap();
            for num_taps in taps {
                let recovered = passband
                    .demodulate(num_taps, Window::Kaiser { beta: 8.6 })
                    .unwrap();
                assert_eq!(recovered.len(), signal.samples().len());
                for (y, b) in recovered.iter().zip(signal.samples()) {
                    assert_float_eq!(y.re, b.re, abs <= 1e-3);
                    assert_float_eq!(y.im, b.im, abs <= 1e-3);
                }
            }
        }
    }
}
