//! Bit-to-symbol index mappers
//!
//! A [`BitMapper`] turns the natural binary index of a group of `k` bits into the coded index
//! of a symbol in an alphabet of size `M = 2^k`. The mapping is always a permutation of
//! `0 .. M`, so it can be inverted to recover the bits from a coded index.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Enumeration of bit-to-symbol index mappings
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum BitMapper {
    /// Natural binary mapping (index `i` maps to `i`)
    Identity,
    /// Reflected-binary (Gray) mapping (index `i` maps to `i ^ (i >> 1)`)
    Gray,
    /// Pseudo-random permutation, reproducible from the seed
    Random {
        /// Seed of the pseudo-random number generator
        seed: u64,
    },
}

impl BitMapper {
    /// Returns the name of the variant.
    fn name(&self) -> &str {
        match self {
            BitMapper::Identity => "Binary",
            BitMapper::Gray => "Gray",
            BitMapper::Random { .. } => "Random",
        }
    }

    /// Returns the coded index for each natural binary index.
    ///
    /// # Parameters
    ///
    /// - `bits_per_symbol`: Number of bits `k` per symbol. The table has `2^k` entries.
    ///
    /// # Returns
    ///
    /// - `table`: Permutation of `0 .. 2^k`, with `table[i]` being the coded index for natural
    ///   binary index `i`.
    ///
    /// # Examples
    ///
    /// ```
    /// use adtx::BitMapper;
    ///
    /// assert_eq!(BitMapper::Identity.table(2), [0, 1, 2, 3]);
    /// assert_eq!(BitMapper::Gray.table(2), [0, 1, 3, 2]);
    /// let seed = 7;
    /// assert_eq!(
    ///     BitMapper::Random { seed }.table(3),
    ///     BitMapper::Random { seed }.table(3)
    /// );
    /// ```
    #[must_use]
    pub fn table(self, bits_per_symbol: u32) -> Vec<usize> {
        let num_symbols = 1usize << bits_per_symbol;
        match self {
            BitMapper::Identity => (0 .. num_symbols).collect(),
            BitMapper::Gray => (0 .. num_symbols).map(|i| i ^ (i >> 1)).collect(),
            BitMapper::Random { seed } => {
                let mut perm: Vec<usize> = (0 .. num_symbols).collect();
                perm.shuffle(&mut StdRng::seed_from_u64(seed));
                perm
            }
        }
    }

    /// Returns the natural binary index for each coded index (inverse of [`BitMapper::table`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use adtx::BitMapper;
    ///
    /// assert_eq!(BitMapper::Gray.inverse_table(3), [0, 1, 3, 2, 7, 6, 4, 5]);
    /// ```
    #[must_use]
    pub fn inverse_table(self, bits_per_symbol: u32) -> Vec<usize> {
        let table = self.table(bits_per_symbol);
        let mut inverse: Vec<usize> = (0 .. table.len()).collect();
        inverse.sort_by_key(|&k| table[k]);
        inverse
    }
}

impl std::fmt::Display for BitMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitMapper::Random { seed } => write!(f, "{} (seed {seed})", self.name()),
            _ => write!(f, "{}", self.name()),
        }
    }
}
