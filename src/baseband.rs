//! # Baseband synthesis
//!
//! A baseband signal is the sum of copies of a pulse, one per symbol, each scaled by the symbol
//! and delayed by the symbol's index times the number of samples per symbol. Overlapping pulses
//! from adjacent symbols add up.
//!
//! The [`synthesize`] function produces the whole signal at once. The [`SynthesisCursor`] type
//! adds one symbol at a time and reports the range of samples each symbol touched, for
//! step-by-step inspection; once all symbols are added its buffer equals the output of
//! [`synthesize`] bit for bit.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use adtx::{
//!     baseband, pulse, sequencer, BitSequence, ModParams, ModulationCodebook, PulseParams,
//!     PulseShape, SynthesisCursor,
//! };
//!
//! let codebook = Arc::new(ModulationCodebook::new(&ModParams::default())?);
//! let bits = Arc::new(BitSequence::from_text("1101")?);
//! let symbols = Arc::new(sequencer::sequence_symbols(bits, codebook)?);
//! let pulse_params = PulseParams::new(PulseShape::CosineSquared, 3);
//! let pulse = Arc::new(pulse::generate(&pulse_params, 10, 80)?);
//! let signal = baseband::synthesize(Arc::clone(&pulse), Arc::clone(&symbols), 80, 10)?;
//! assert_eq!(signal.samples().len(), 3 * 8 + 24);
//!
//! let mut cursor = SynthesisCursor::new(pulse, symbols, 80, 10)?;
//! let ranges: Vec<_> = cursor.by_ref().map(|step| step.range).collect();
//! assert_eq!(ranges, [0 .. 24, 8 .. 32, 16 .. 40, 24 .. 48]);
//! assert_eq!(cursor.buffer(), signal.samples());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::ops::Range;
use std::sync::Arc;

use num_complex::Complex64;

use crate::{Error, PulseWaveform, SymbolSequence};

/// Sampled complex baseband signal
#[derive(Clone, PartialEq, Debug)]
pub struct BasebandSignal {
    /// Complex samples
    samples: Vec<Complex64>,
    /// Sample rate (samples per second)
    sample_rate: u32,
    /// Symbol rate (symbols per second)
    symbol_rate: u32,
    /// Pulse the signal was synthesized with
    pulse: Arc<PulseWaveform>,
    /// Symbols the signal was synthesized from
    symbols: Arc<SymbolSequence>,
}

impl BasebandSignal {
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

    /// Returns the pulse the signal was synthesized with.
    #[must_use]
    pub fn pulse(&self) -> &Arc<PulseWaveform> {
        &self.pulse
    }

    /// Returns the symbols the signal was synthesized from.
    #[must_use]
    pub fn symbols(&self) -> &Arc<SymbolSequence> {
        &self.symbols
    }

    /// Returns the number of samples per symbol period.
    #[must_use]
    pub fn samples_per_symbol(&self) -> usize {
        self.pulse.samples_per_symbol()
    }

    /// Returns a descriptive label.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "Baseband ({}, {})",
            self.symbols.codebook().label(),
            self.pulse.params().shape
        )
    }

    /// Returns the index of the sample at the center of each symbol's pulse.
    pub fn symbol_centers(&self) -> impl Iterator<Item = usize> + '_ {
        let sps = self.samples_per_symbol();
        let center = self.pulse.center_index();
        (0 .. self.symbols.len()).map(move |i| i * sps + center)
    }
}

/// Returns number of samples in the baseband signal for given number of symbols.
#[must_use]
pub fn signal_len(num_symbols: usize, samples_per_symbol: usize, pulse_len: usize) -> usize {
    match num_symbols {
        0 => 0,
        _ => (num_symbols - 1) * samples_per_symbol + pulse_len,
    }
}

/// Returns baseband signal for given pulse and symbols.
///
/// # Parameters
///
/// - `pulse`: Pulse waveform. Its rates must equal `sample_rate` and `symbol_rate`.
///
/// - `symbols`: Symbol sequence (at least one symbol).
///
/// - `sample_rate`: Expected sample rate (samples per second).
///
/// - `symbol_rate`: Expected symbol rate (symbols per second).
///
/// # Returns
///
/// - `signal`: Baseband signal with `(num_symbols - 1) * samples_per_symbol + pulse_len`
///   samples.
///
/// # Errors
///
/// Returns an error if the pulse rates differ from the expected rates, or if `symbols` is empty.
pub fn synthesize(
    pulse: Arc<PulseWaveform>,
    symbols: Arc<SymbolSequence>,
    sample_rate: u32,
    symbol_rate: u32,
) -> Result<BasebandSignal, Error> {
    check_inputs(&pulse, &symbols, sample_rate, symbol_rate)?;
    let sps = pulse.samples_per_symbol();
    let mut samples = vec![
        Complex64::new(0.0, 0.0);
        signal_len(symbols.len(), sps, pulse.samples().len())
    ];
    for (i, &symbol) in symbols.symbols().iter().enumerate() {
        add_pulse(&mut samples, pulse.samples(), symbol, i * sps);
    }
    tracing::debug!(
        num_symbols = symbols.len(),
        num_samples = samples.len(),
        sample_rate,
        "Synthesized baseband signal"
    );
    Ok(BasebandSignal {
        samples,
        sample_rate,
        symbol_rate,
        pulse,
        symbols,
    })
}

/// Checks that pulse and symbols can be combined at the expected rates.
fn check_inputs(
    pulse: &PulseWaveform,
    symbols: &SymbolSequence,
    sample_rate: u32,
    symbol_rate: u32,
) -> Result<(), Error> {
    if pulse.sample_rate() != sample_rate || pulse.symbol_rate() != symbol_rate {
        return Err(Error::MismatchedRate(format!(
            "Pulse generated at {} samples/s and {} symbols/s, expected {sample_rate} samples/s \
             and {symbol_rate} symbols/s",
            pulse.sample_rate(),
            pulse.symbol_rate()
        )));
    }
    if symbols.is_empty() {
        return Err(Error::LengthMismatch(
            "Expected at least one symbol for baseband synthesis".to_string(),
        ));
    }
    Ok(())
}

/// Adds the pulse scaled by the symbol into the buffer at the offset, and returns the range of
/// samples touched.
fn add_pulse(
    buffer: &mut [Complex64],
    pulse: &[f64],
    symbol: Complex64,
    offset: usize,
) -> Range<usize> {
    let range = offset .. offset + pulse.len();
    for (out, &p) in buffer[range.clone()].iter_mut().zip(pulse) {
        *out += symbol * p;
    }
    range
}

/// Outcome of adding one symbol with a [`SynthesisCursor`]
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SynthesisStep {
    /// Index of the symbol just added
    pub symbol_index: usize,
    /// Range of buffer samples touched by the symbol's pulse
    pub range: Range<usize>,
}

/// Cursor adding symbols into a baseband buffer one at a time
///
/// Each cursor owns its buffer, so several cursors over the same pulse and symbols are
/// independent of each other.
#[derive(Clone, Debug)]
pub struct SynthesisCursor {
    /// Pulse to be scaled by each symbol
    pulse: Arc<PulseWaveform>,
    /// Symbols to be added
    symbols: Arc<SymbolSequence>,
    /// Index of the next symbol to be added
    next_symbol: usize,
    /// Accumulated samples
    buffer: Vec<Complex64>,
}

impl SynthesisCursor {
    /// Returns cursor positioned before the first symbol, with an all-zero buffer.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`synthesize`].
    pub fn new(
        pulse: Arc<PulseWaveform>,
        symbols: Arc<SymbolSequence>,
        sample_rate: u32,
        symbol_rate: u32,
    ) -> Result<Self, Error> {
        check_inputs(&pulse, &symbols, sample_rate, symbol_rate)?;
        let len = signal_len(
            symbols.len(),
            pulse.samples_per_symbol(),
            pulse.samples().len(),
        );
        Ok(Self {
            pulse,
            symbols,
            next_symbol: 0,
            buffer: vec![Complex64::new(0.0, 0.0); len],
        })
    }

    /// Adds the next symbol's pulse into the buffer.
    ///
    /// Returns `None` once all symbols have been added.
    pub fn advance(&mut self) -> Option<SynthesisStep> {
        let symbol = *self.symbols.symbols().get(self.next_symbol)?;
        let offset = self.next_symbol * self.pulse.samples_per_symbol();
        let range = add_pulse(&mut self.buffer, self.pulse.samples(), symbol, offset);
        let step = SynthesisStep {
            symbol_index: self.next_symbol,
            range,
        };
        self.next_symbol += 1;
        Some(step)
    }

    /// Returns the samples accumulated so far.
    #[must_use]
    pub fn buffer(&self) -> &[Complex64] {
        &self.buffer
    }

    /// Returns the number of symbols added so far.
    #[must_use]
    pub fn num_added(&self) -> usize {
        self.next_symbol
    }

    /// Returns `true` once all symbols have been added.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.next_symbol == self.symbols.len()
    }

    /// Clears the buffer and repositions the cursor before the first symbol.
    pub fn restart(&mut self) {
        self.buffer.fill(Complex64::new(0.0, 0.0));
        self.next_symbol = 0;
    }

    /// Adds all remaining symbols and returns the completed baseband signal.
    #[must_use]
    pub fn finish(mut self) -> BasebandSignal {
        while self.advance().is_some() {}
        BasebandSignal {
            sample_rate: self.pulse.sample_rate(),
            symbol_rate: self.pulse.symbol_rate(),
            samples: self.buffer,
            pulse: self.pulse,
            symbols: self.symbols,
        }
    }
}

impl Iterator for SynthesisCursor {
    type Item = SynthesisStep;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
