//! # Linear-phase FIR filter design and application
//!
//! Lowpass filters are designed by the window method: an ideal (sinc) impulse response with the
//! requested cutoff is truncated to the requested number of taps, weighted by a [`Window`] and
//! scaled to unity gain at zero frequency. Cutoff frequencies are normalized to the Nyquist
//! frequency, so a cutoff of `1.0` corresponds to half the sample rate.
//!
//! # Examples
//!
//! ```
//! use adtx::{filter, Complex64, Window};
//!
//! let taps = filter::lowpass(21, 0.25, Window::Kaiser { beta: 8.6 })?;
//! assert!((taps.iter().sum::<f64>() - 1.0).abs() < 1e-12);
//! assert_eq!(filter::group_delay(taps.len()), 10);
//!
//! let samples = vec![Complex64::new(1.0, 0.0); 5];
//! let upsampled = filter::upfirdn(&samples, &taps, 4);
//! assert_eq!(upsampled.len(), 4 * 4 + 21);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Relative size of the last series term at which the Bessel function evaluation stops
const BESSEL_TOL: f64 = 1e-16;

/// Enumeration of window functions for FIR design
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum Window {
    /// Hamming window, `0.54 - 0.46 * cos(2*pi*n / (N-1))`
    Hamming,
    /// Kaiser window with shape parameter `beta`
    Kaiser {
        /// Shape parameter (larger values trade a wider main lobe for lower side lobes)
        beta: f64,
    },
}

impl Window {
    /// Returns the window samples for the given length.
    ///
    /// A window of length one is `[1.0]`, and a window of length zero is empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn generate(self, len: usize) -> Vec<f64> {
        if len <= 1 {
            return vec![1.0; len];
        }
        let last = (len - 1) as f64;
        match self {
            Window::Hamming => (0 .. len)
                .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / last).cos())
                .collect(),
            Window::Kaiser { beta } => {
                let scale = bessel_i0(beta);
                (0 .. len)
                    .map(|n| {
                        let ratio = 2.0 * n as f64 / last - 1.0;
                        bessel_i0(beta * (1.0 - ratio * ratio).max(0.0).sqrt()) / scale
                    })
                    .collect()
            }
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Window::Hamming => write!(f, "Hamming"),
            Window::Kaiser { beta } => write!(f, "Kaiser (beta {beta})"),
        }
    }
}

/// Returns the zeroth-order modified Bessel function of the first kind, by its power series.
#[allow(clippy::cast_precision_loss)]
fn bessel_i0(x: f64) -> f64 {
    let half_x_sq = (x / 2.0).powi(2);
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    while term > BESSEL_TOL * sum {
        term *= half_x_sq / (k * k);
        sum += term;
        k += 1.0;
    }
    sum
}

/// Returns `sin(pi*x) / (pi*x)`, exactly `1.0` at zero and exactly `0.0` at other integers.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else if x.fract() == 0.0 {
        0.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Returns taps of a linear-phase lowpass FIR filter designed by the window method.
///
/// # Parameters
///
/// - `num_taps`: Number of taps (at least one).
///
/// - `cutoff`: Cutoff frequency normalized to the Nyquist frequency, in `(0, 1]`.
///
/// - `window`: Window weighting the truncated ideal impulse response.
///
/// # Returns
///
/// - `taps`: Symmetric filter taps summing to one.
///
/// # Errors
///
/// Returns an error if `num_taps` is zero or if `cutoff` is not in `(0, 1]`.
#[allow(clippy::cast_precision_loss)]
pub fn lowpass(num_taps: usize, cutoff: f64, window: Window) -> Result<Vec<f64>, Error> {
    if num_taps == 0 {
        return Err(Error::InvalidParameter(
            "Filter must have at least one tap".to_string(),
        ));
    }
    if !(cutoff > 0.0 && cutoff <= 1.0) {
        return Err(Error::InvalidParameter(format!(
            "Normalized cutoff frequency must be in (0, 1] (found {cutoff})"
        )));
    }
    let mid = (num_taps - 1) as f64 / 2.0;
    let mut taps: Vec<f64> = window
        .generate(num_taps)
        .into_iter()
        .enumerate()
        .map(|(n, w)| cutoff * sinc(cutoff * (n as f64 - mid)) * w)
        .collect();
    let dc_gain: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= dc_gain;
    }
    tracing::debug!(num_taps, cutoff, %window, "Designed lowpass filter");
    Ok(taps)
}

/// Returns the group delay, in samples, of a linear-phase filter with the given number of taps.
#[must_use]
pub fn group_delay(num_taps: usize) -> usize {
    num_taps.saturating_sub(1) / 2
}

/// Returns samples with `factor - 1` zeros inserted between consecutive samples.
///
/// The output has `(len - 1) * factor + 1` samples for a non-empty input.
#[must_use]
pub fn zero_stuff(samples: &[Complex64], factor: usize) -> Vec<Complex64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut out = vec![Complex64::new(0.0, 0.0); (samples.len() - 1) * factor + 1];
    for (i, &x) in samples.iter().enumerate() {
        out[i * factor] = x;
    }
    out
}

/// Returns full linear convolution of complex samples with real taps.
///
/// The output has `len + num_taps - 1` samples, or none if either input is empty.
#[must_use]
pub fn convolve(samples: &[Complex64], taps: &[f64]) -> Vec<Complex64> {
    upfirdn(samples, taps, 1)
}

/// Returns samples upsampled by zero-stuffing and filtered, without forming the zero-stuffed
/// sequence.
///
/// Equal to `convolve(&zero_stuff(samples, factor), taps)`, with `(len - 1) * factor + num_taps`
/// samples.
#[must_use]
pub fn upfirdn(samples: &[Complex64], taps: &[f64], factor: usize) -> Vec<Complex64> {
    if samples.is_empty() || taps.is_empty() {
        return Vec::new();
    }
    let mut out = vec![Complex64::new(0.0, 0.0); (samples.len() - 1) * factor + taps.len()];
    for (i, &x) in samples.iter().enumerate() {
        for (y, &h) in out[i * factor ..].iter_mut().zip(taps) {
            *y += x * h;
        }
    }
    out
}

#[cfg(test)]
mod tests_of_window {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_short_windows() {
        assert!(Window::Hamming.generate(0).is_empty());
        assert_eq!(Window::Hamming.generate(1), [1.0]);
        assert_eq!(Window::Kaiser { beta: 5.0 }.generate(1), [1.0]);
    }

    #[test]
    fn test_hamming() {
        let w = Window::Hamming.generate(5);
        assert_float_eq!(w, vec![0.08, 0.54, 1.0, 0.54, 0.08], abs_all <= 1e-12);
    }

    #[test]
    fn test_kaiser() {
        for beta in [0.0, 2.0, 8.6] {
            let w = Window::Kaiser { beta }.generate(31);
            assert_float_eq!(w[15], 1.0, abs <= 1e-12);
            for n in 0 .. 15 {
                assert_float_eq!(w[n], w[30 - n], abs <= 1e-12);
                assert!(w[n] <= w[n + 1] + 1e-12);
            }
        }
        // Kaiser window with beta zero is rectangular
        let w = Window::Kaiser { beta: 0.0 }.generate(8);
        assert_float_eq!(w, vec![1.0; 8], abs_all <= 1e-12);
        // Edges of a Kaiser window are 1 / I0(beta)
        let w = Window::Kaiser { beta: 8.6 }.generate(11);
        assert_float_eq!(w[0], 1.0 / bessel_i0(8.6), abs <= 1e-15);
    }

    #[test]
    fn test_bessel_i0() {
        assert_float_eq!(bessel_i0(0.0), 1.0, abs <= 1e-15);
        assert_float_eq!(bessel_i0(1.0), 1.266_065_877_752_008_4, rmax <= 1e-14);
        assert_float_eq!(bessel_i0(5.0), 27.239_871_823_604_45, rmax <= 1e-14);
        assert_float_eq!(bessel_i0(-5.0), bessel_i0(5.0), rmax <= 1e-15);
    }

    #[test]
    fn test_display() {
        assert_eq!(Window::Hamming.to_string(), "Hamming");
        assert_eq!(Window::Kaiser { beta: 8.6 }.to_string(), "Kaiser (beta 8.6)");
    }
}
