//! Power-normalized modulation codebooks

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::{BitMapper, Error};

/// Enumeration of modulation schemes
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum ModulationScheme {
    /// M-ary amplitude-shift keying (real, symmetric odd-integer levels)
    AmplitudeShiftKeying,
    /// M-ary phase-shift keying (unit circle)
    PhaseShiftKeying,
}

impl ModulationScheme {
    /// Returns the short name of the variant.
    fn short_name(self) -> &'static str {
        match self {
            ModulationScheme::AmplitudeShiftKeying => "ASK",
            ModulationScheme::PhaseShiftKeying => "PSK",
        }
    }
}

/// Parameters selecting a modulation codebook
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct ModParams {
    /// Modulation scheme
    pub scheme: ModulationScheme,
    /// Alphabet size `M` (power of two, greater than one)
    pub cardinality: usize,
    /// Bit-to-symbol index mapping
    pub mapper: BitMapper,
}

impl ModParams {
    /// Returns modulation parameters with the given fields.
    #[must_use]
    pub fn new(scheme: ModulationScheme, cardinality: usize, mapper: BitMapper) -> Self {
        Self {
            scheme,
            cardinality,
            mapper,
        }
    }
}

impl Default for ModParams {
    fn default() -> Self {
        Self::new(ModulationScheme::AmplitudeShiftKeying, 2, BitMapper::Identity)
    }
}

/// Mapping from natural binary symbol index to complex amplitude, with unit average power
#[derive(Clone, PartialEq, Debug)]
pub struct ModulationCodebook {
    /// Parameters the codebook was built from
    params: ModParams,
    /// Number of bits per symbol (`log2(M)`)
    bits_per_symbol: u32,
    /// Complex symbol for each natural binary index
    symbols: Vec<Complex64>,
}

impl ModulationCodebook {
    /// Returns codebook for the given modulation parameters.
    ///
    /// # Parameters
    ///
    /// - `params`: Scheme, cardinality `M` and bit mapper. For amplitude-shift keying, the levels
    ///   are the odd integers `-(M-1), -(M-3), ..., M-1`, reordered by the mapper and scaled to
    ///   unit average power. For phase-shift keying, the phases are `2*pi*i/M`, reordered by the
    ///   mapper.
    ///
    /// # Errors
    ///
    /// Returns an error if `params.cardinality` is not a power of two greater than one.
    ///
    /// # Examples
    ///
    /// ```
    /// use adtx::{BitMapper, ModParams, ModulationCodebook, ModulationScheme};
    ///
    /// let params = ModParams::new(ModulationScheme::AmplitudeShiftKeying, 4, BitMapper::Gray);
    /// let codebook = ModulationCodebook::new(&params)?;
    /// let levels: Vec<f64> = codebook.symbols().iter().map(|s| s.re * 5f64.sqrt()).collect();
    /// assert!((levels[0] + 3.0).abs() < 1e-12);
    /// assert!((levels[2] - 3.0).abs() < 1e-12);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(params: &ModParams) -> Result<Self, Error> {
        let bits_per_symbol = bits_per_symbol(params.cardinality)?;
        let table = params.mapper.table(bits_per_symbol);
        let symbols = match params.scheme {
            ModulationScheme::AmplitudeShiftKeying => ask_symbols(&table),
            ModulationScheme::PhaseShiftKeying => psk_symbols(&table),
        };
        let codebook = Self {
            params: *params,
            bits_per_symbol,
            symbols,
        };
        tracing::debug!(
            label = %codebook.label(),
            mapper = %params.mapper,
            "Built modulation codebook"
        );
        Ok(codebook)
    }

    /// Returns the symbol for the given natural binary index, if the index is in range.
    #[must_use]
    pub fn symbol(&self, index: usize) -> Option<Complex64> {
        self.symbols.get(index).copied()
    }

    /// Returns the symbols, indexed by natural binary index.
    #[must_use]
    pub fn symbols(&self) -> &[Complex64] {
        &self.symbols
    }

    /// Returns the parameters the codebook was built from.
    #[must_use]
    pub fn params(&self) -> &ModParams {
        &self.params
    }

    /// Returns the alphabet size `M`.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.params.cardinality
    }

    /// Returns the number of bits per symbol.
    #[must_use]
    pub fn bits_per_symbol(&self) -> u32 {
        self.bits_per_symbol
    }

    /// Returns the modulation scheme.
    #[must_use]
    pub fn scheme(&self) -> ModulationScheme {
        self.params.scheme
    }

    /// Returns the bit mapper.
    #[must_use]
    pub fn mapper(&self) -> BitMapper {
        self.params.mapper
    }

    /// Returns the mean squared magnitude of the symbols.
    #[must_use]
    pub fn mean_power(&self) -> f64 {
        crate::utils::mean_power(&self.symbols)
    }

    /// Returns a label such as `"4-ASK"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.params.cardinality,
            self.params.scheme.short_name()
        )
    }
}

/// Returns `log2(cardinality)` after checking that `cardinality` is a power of two above one.
fn bits_per_symbol(cardinality: usize) -> Result<u32, Error> {
    if cardinality <= 1 || !cardinality.is_power_of_two() {
        return Err(Error::InvalidParameter(format!(
            "Cardinality must be a power of 2 greater than 1 (found {cardinality})"
        )));
    }
    Ok(cardinality.trailing_zeros())
}

/// Returns unit-power amplitude-shift-keying symbols reordered by the given mapping table.
#[allow(clippy::cast_precision_loss)]
fn ask_symbols(table: &[usize]) -> Vec<Complex64> {
    let num_symbols = table.len();
    let levels: Vec<f64> = (0 .. num_symbols)
        .map(|i| (2 * i) as f64 - (num_symbols - 1) as f64)
        .collect();
    let power = levels.iter().map(|x| x * x).sum::<f64>() / num_symbols as f64;
    let scale = power.sqrt();
    table
        .iter()
        .map(|&coded| Complex64::new(levels[coded] / scale, 0.0))
        .collect()
}

/// Returns unit-circle phase-shift-keying symbols reordered by the given mapping table.
#[allow(clippy::cast_precision_loss)]
fn psk_symbols(table: &[usize]) -> Vec<Complex64> {
    let num_symbols = table.len() as f64;
    table
        .iter()
        .map(|&coded| {
            Complex64::from_polar(1.0, 2.0 * std::f64::consts::PI * coded as f64 / num_symbols)
        })
        .collect()
}

#[cfg(test)]
mod tests_of_modulation_codebook {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn test_new() {
        // Invalid input
        for cardinality in [0, 1, 3, 6, 12] {
            let params = ModParams::new(
                ModulationScheme::AmplitudeShiftKeying,
                cardinality,
                BitMapper::Identity,
            );
            assert!(ModulationCodebook::new(&params).is_err());
        }
        // Valid input
        let params = ModParams::new(ModulationScheme::PhaseShiftKeying, 8, BitMapper::Gray);
        let codebook = ModulationCodebook::new(&params).unwrap();
        assert_eq!(codebook.cardinality(), 8);
        assert_eq!(codebook.bits_per_symbol(), 3);
        assert_eq!(codebook.symbols().len(), 8);
        assert_eq!(codebook.scheme(), ModulationScheme::PhaseShiftKeying);
        assert_eq!(codebook.mapper(), BitMapper::Gray);
        assert_eq!(codebook.label(), "8-PSK");
    }

    #[test]
    fn test_unit_mean_power() {
        for scheme in [
            ModulationScheme::AmplitudeShiftKeying,
            ModulationScheme::PhaseShiftKeying,
        ] {
            for mapper in [
                BitMapper::Identity,
                BitMapper::Gray,
                BitMapper::Random { seed: 11 },
            ] {
                for k in 1 .. 9 {
                    let params = ModParams::new(scheme, 1 << k, mapper);
                    let codebook = ModulationCodebook::new(&params).unwrap();
                    assert_float_eq!(codebook.mean_power(), 1.0, abs <= 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_ask_binary() {
        let codebook = ModulationCodebook::new(&ModParams::default()).unwrap();
        assert_eq!(
            codebook.symbols(),
            [Complex64::new(-1.0, 0.0), Complex64::new(1.0, 0.0)]
        );
    }

    #[test]
    fn test_ask_gray() {
        let params = ModParams::new(ModulationScheme::AmplitudeShiftKeying, 4, BitMapper::Gray);
        let codebook = ModulationCodebook::new(&params).unwrap();
        let scale = 5f64.sqrt();
        let expected = [-3.0 / scale, -1.0 / scale, 3.0 / scale, 1.0 / scale];
        for (symbol, level) in codebook.symbols().iter().zip(expected) {
            assert_float_eq!(symbol.re, level, abs <= 1e-12);
            assert_float_eq!(symbol.im, 0.0, abs <= 1e-12);
        }
    }

    #[test]
    fn test_psk_identity() {
        let params = ModParams::new(ModulationScheme::PhaseShiftKeying, 4, BitMapper::Identity);
        let codebook = ModulationCodebook::new(&params).unwrap();
        let expected = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
        for (symbol, (re, im)) in codebook.symbols().iter().zip(expected) {
            assert_float_eq!(symbol.re, re, abs <= 1e-12);
            assert_float_eq!(symbol.im, im, abs <= 1e-12);
        }
    }

    #[test]
    fn test_random_reproducible() {
        let params = ModParams::new(
            ModulationScheme::PhaseShiftKeying,
            16,
            BitMapper::Random { seed: 99 },
        );
        assert_eq!(
            ModulationCodebook::new(&params).unwrap(),
            ModulationCodebook::new(&params).unwrap()
        );
    }

    #[test]
    fn test_symbol() {
        let codebook = ModulationCodebook::new(&ModParams::default()).unwrap();
        assert_eq!(codebook.symbol(1), Some(Complex64::new(1.0, 0.0)));
        assert_eq!(codebook.symbol(2), None);
    }

    #[test]
    fn test_bits_per_symbol() {
        assert!(bits_per_symbol(0).is_err());
        assert!(bits_per_symbol(1).is_err());
        assert!(bits_per_symbol(5).is_err());
        assert_eq!(bits_per_symbol(2).unwrap(), 1);
        assert_eq!(bits_per_symbol(64).unwrap(), 6);
    }
}
