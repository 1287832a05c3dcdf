//! # Some useful functions for exercising and checking the signal chain
//!
//! The [`random_bits`] function returns a given number of random bits, and [`bit_errors`] counts
//! the bits received in error. The [`mean_power`], [`peak_magnitude`] and [`amplitude_db`]
//! functions summarize sample arrays.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use adtx::utils;
//!
//! let mut rng = rand::rng();
//! let bits = utils::random_bits(40, &mut rng);
//! assert_eq!(utils::bit_errors(&bits, &bits), 0);
//! assert_eq!(utils::bit_errors(&bits[.. 30], &bits), 10);
//! ```

use num_complex::Complex64;
use rand::Rng;

use crate::Bit;

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// - `rng`: Random number generator to be used.
///
/// # Returns
///
/// - `bits`: Random bits.
pub fn random_bits<R: Rng>(num_bits: usize, rng: &mut R) -> Vec<Bit> {
    (0 .. num_bits)
        .map(|_| {
            if rng.random_bool(0.5) {
                Bit::One
            } else {
                Bit::Zero
            }
        })
        .collect()
}

/// Returns number of bits received in error.
///
/// Bits missing from `received`, or received beyond the end of `sent`, are errors too.
#[must_use]
pub fn bit_errors(received: &[Bit], sent: &[Bit]) -> usize {
    let flipped = received.iter().zip(sent).filter(|(r, s)| r != s).count();
    flipped + received.len().abs_diff(sent.len())
}

/// Returns mean squared magnitude of the samples (`0.0` for an empty slice).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_power(samples: &[Complex64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(Complex64::norm_sqr).sum::<f64>() / samples.len() as f64
}

/// Returns largest magnitude among the samples (`0.0` for an empty slice).
#[must_use]
pub fn peak_magnitude(samples: &[Complex64]) -> f64 {
    samples.iter().map(|x| x.norm()).fold(0.0, f64::max)
}

/// Returns amplitude ratio in dB, `20 * log10(value / reference)`.
///
/// A zero `value` gives negative infinity.
#[must_use]
pub fn amplitude_db(value: f64, reference: f64) -> f64 {
    20.0 * (value / reference).log10()
}
