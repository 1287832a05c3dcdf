//! Grouping of bits into symbols and codebook lookup

use std::sync::Arc;

use num_complex::Complex64;

use crate::{Bit, BitSequence, Error, ModulationCodebook};

/// Ordered sequence of complex symbols, with the bit sequence and codebook it was built from
#[derive(Clone, PartialEq, Debug)]
pub struct SymbolSequence {
    /// Complex symbols in transmission order
    symbols: Vec<Complex64>,
    /// Natural binary index of each symbol
    indices: Vec<usize>,
    /// Originating bit sequence
    bits: Arc<BitSequence>,
    /// Originating codebook
    codebook: Arc<ModulationCodebook>,
}

impl SymbolSequence {
    /// Returns the complex symbols.
    #[must_use]
    pub fn symbols(&self) -> &[Complex64] {
        &self.symbols
    }

    /// Returns the natural binary index of each symbol.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the coded index of each symbol (the natural index passed through the mapper).
    #[must_use]
    pub fn coded_indices(&self) -> Vec<usize> {
        let table = self.codebook.mapper().table(self.codebook.bits_per_symbol());
        self.indices.iter().map(|&i| table[i]).collect()
    }

    /// Returns the originating bit sequence.
    #[must_use]
    pub fn bits(&self) -> &Arc<BitSequence> {
        &self.bits
    }

    /// Returns the originating codebook.
    #[must_use]
    pub fn codebook(&self) -> &Arc<ModulationCodebook> {
        &self.codebook
    }

    /// Returns the number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the sequence holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns the number of trailing bits that did not fill a whole symbol and were dropped.
    #[must_use]
    pub fn num_dropped_bits(&self) -> usize {
        self.bits.len() - self.symbols.len() * self.codebook.bits_per_symbol() as usize
    }

    /// Returns the bits carried by the symbols, recovered from their coded indices.
    ///
    /// This equals the originating bits truncated to a whole number of symbols.
    #[must_use]
    pub fn recover_bits(&self) -> Vec<Bit> {
        let inverse = self
            .codebook
            .mapper()
            .inverse_table(self.codebook.bits_per_symbol());
        let natural: Vec<usize> = self.coded_indices().iter().map(|&c| inverse[c]).collect();
        indices_to_bits(&natural, self.codebook.bits_per_symbol())
    }
}

/// Returns symbol sequence for given bits and codebook.
///
/// # Parameters
///
/// - `bits`: Bits to be mapped. Trailing bits that do not fill a whole symbol are dropped.
///
/// - `codebook`: Codebook with `M = 2^k` symbols. Each group of `k` bits is read as an unsigned
///   integer with the first bit as MSB, and that integer indexes the codebook.
///
/// # Errors
///
/// Returns an error if `bits` holds fewer than `k` bits.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use adtx::{sequencer, BitMapper, BitSequence, ModParams, ModulationCodebook, ModulationScheme};
///
/// let params = ModParams::new(ModulationScheme::PhaseShiftKeying, 4, BitMapper::Identity);
/// let codebook = Arc::new(ModulationCodebook::new(&params)?);
/// let bits = Arc::new(BitSequence::from_text("0110111")?);
/// let symbols = sequencer::sequence_symbols(bits, codebook)?;
/// assert_eq!(symbols.indices(), [1, 2, 3]);
/// assert_eq!(symbols.num_dropped_bits(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn sequence_symbols(
    bits: Arc<BitSequence>,
    codebook: Arc<ModulationCodebook>,
) -> Result<SymbolSequence, Error> {
    let bits_per_symbol = codebook.bits_per_symbol() as usize;
    if bits.len() < bits_per_symbol {
        return Err(Error::LengthMismatch(format!(
            "Expected at least {bits_per_symbol} bits for one {} symbol (found {})",
            codebook.label(),
            bits.len()
        )));
    }
    let indices: Vec<usize> = bits
        .bits()
        .chunks_exact(bits_per_symbol)
        .map(|chunk| chunk.iter().fold(0, |acc, bit| (acc << 1) | bit.value()))
        .collect();
    let symbols = indices
        .iter()
        .map(|&index| codebook.symbols()[index])
        .collect();
    tracing::debug!(
        num_symbols = indices.len(),
        num_dropped_bits = bits.len() % bits_per_symbol,
        "Sequenced symbols"
    );
    Ok(SymbolSequence {
        symbols,
        indices,
        bits,
        codebook,
    })
}

/// Returns natural binary index of the codebook symbol nearest to each sample.
///
/// # Parameters
///
/// - `samples`: Received samples, one per symbol.
///
/// - `codebook`: Codebook the samples were drawn from.
///
/// # Returns
///
/// - `indices`: For each sample, the index of the codebook symbol at minimum Euclidean distance.
#[must_use]
pub fn nearest_indices(samples: &[Complex64], codebook: &ModulationCodebook) -> Vec<usize> {
    samples
        .iter()
        .map(|sample| {
            codebook
                .symbols()
                .iter()
                .map(|symbol| (sample - symbol).norm_sqr())
                .enumerate()
                .min_by(|(_, x), (_, y)| x.total_cmp(y))
                .map_or(0, |(index, _)| index)
        })
        .collect()
}

/// Returns bits for natural binary indices, `bits_per_symbol` bits per index, MSB first.
///
/// # Examples
///
/// ```
/// use adtx::{sequencer, Bit};
/// use Bit::{One, Zero};
///
/// assert_eq!(sequencer::indices_to_bits(&[2, 1], 2), [One, Zero, Zero, One]);
/// ```
#[must_use]
pub fn indices_to_bits(indices: &[usize], bits_per_symbol: u32) -> Vec<Bit> {
    indices
        .iter()
        .flat_map(|&index| {
            (0 .. bits_per_symbol).rev().map(move |pos| match (index >> pos) & 1 {
                0 => Bit::Zero,
                _ => Bit::One,
            })
        })
        .collect()
}
