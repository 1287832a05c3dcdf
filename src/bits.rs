//! Bit sequences entering the signal chain
//!
//! A [`BitSequence`] is immutable once built. It is usually parsed from the text typed by a user
//! (only the characters `0` and `1` are accepted), and may carry the bit rate at which it is
//! declared to be transmitted.

use itertools::Itertools;

use crate::{Bit, Error};

/// Barker code of length 7, commonly prepended to a frame as a synchronization preamble
pub const BARKER_7: [Bit; 7] = [
    Bit::One,
    Bit::One,
    Bit::One,
    Bit::Zero,
    Bit::Zero,
    Bit::One,
    Bit::Zero,
];

/// Ordered sequence of bits with an optional declared bit rate
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct BitSequence {
    /// Bits in transmission order
    bits: Vec<Bit>,
    /// Declared bit rate (bits per second), if any
    bit_rate: Option<u32>,
}

impl BitSequence {
    /// Returns bit sequence holding the given bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use adtx::{Bit, BitSequence};
    ///
    /// let bits = BitSequence::new(&[Bit::One, Bit::Zero]);
    /// assert_eq!(bits.len(), 2);
    /// ```
    #[must_use]
    pub fn new(bits: &[Bit]) -> Self {
        Self {
            bits: bits.to_vec(),
            bit_rate: None,
        }
    }

    /// Returns bit sequence parsed from text made up of the characters `0` and `1`.
    ///
    /// # Parameters
    ///
    /// - `text`: Bit text. An empty string yields an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` contains any character other than `0` and `1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use adtx::{Bit, BitSequence};
    ///
    /// let bits = BitSequence::from_text("101")?;
    /// assert_eq!(bits.bits(), [Bit::One, Bit::Zero, Bit::One]);
    /// assert!(BitSequence::from_text("10 1").is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_text(text: &str) -> Result<Self, Error> {
        let bits = text
            .chars()
            .enumerate()
            .map(|(pos, ch)| match ch {
                '0' => Ok(Bit::Zero),
                '1' => Ok(Bit::One),
                _ => Err(Error::InvalidBitText(format!(
                    "Invalid character {ch:?} at position {pos} of bit text (expected '0' or '1')"
                ))),
            })
            .collect::<Result<Vec<Bit>, Error>>()?;
        Ok(Self {
            bits,
            bit_rate: None,
        })
    }

    /// Returns bit sequence built from integer values, each of which must be `0` or `1`.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is neither `0` nor `1`.
    pub fn from_values(values: &[u8]) -> Result<Self, Error> {
        let bits = values
            .iter()
            .enumerate()
            .map(|(pos, &val)| {
                Bit::from_value(val).ok_or_else(|| {
                    Error::InvalidBitText(format!(
                        "Invalid bit value {val} at position {pos} (expected 0 or 1)"
                    ))
                })
            })
            .collect::<Result<Vec<Bit>, Error>>()?;
        Ok(Self {
            bits,
            bit_rate: None,
        })
    }

    /// Returns the same bits with the given declared bit rate.
    #[must_use]
    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Returns a new sequence with the Barker-7 preamble in front of these bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use adtx::BitSequence;
    ///
    /// let bits = BitSequence::from_text("01")?.with_barker_prefix();
    /// assert_eq!(bits.to_string(), "111001001");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn with_barker_prefix(&self) -> Self {
        let mut bits = Vec::with_capacity(BARKER_7.len() + self.bits.len());
        bits.extend_from_slice(&BARKER_7);
        bits.extend_from_slice(&self.bits);
        Self {
            bits,
            bit_rate: self.bit_rate,
        }
    }

    /// Returns the bits.
    #[must_use]
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Returns the declared bit rate, if any.
    #[must_use]
    pub fn bit_rate(&self) -> Option<u32> {
        self.bit_rate
    }

    /// Returns the number of bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the sequence holds no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

impl std::fmt::Display for BitSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits.iter().join(""))
    }
}
