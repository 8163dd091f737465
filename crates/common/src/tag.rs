//! Fixed-width bit-vector tags.
//!
//! Tags replace addresses: a module is reached by the tag that most closely
//! matches the requested one, not by its position. The [`Tag`] trait is the
//! contract the matching layer relies on; [`BitTag`] is the concrete
//! bit-vector used by default.

use std::fmt;
use std::str::FromStr;

use crate::error::TagParseError;

/// A fixed-width bit-vector usable for similarity-based addressing.
pub trait Tag: Clone + Eq + fmt::Debug + fmt::Display {
    /// Number of bits in the tag.
    fn width(&self) -> usize;

    /// Number of bit positions at which `self` and `other` differ.
    fn hamming(&self, other: &Self) -> u32;
}

/// An `N`-bit tag (1 ≤ `N` ≤ 128).
///
/// Bits above `N` are always zero. Bit 0 is the least significant bit and is
/// printed last, so `BitTag::<4>::new(0b0101)` displays as `0101`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BitTag<const N: usize> {
    bits: u128,
}

/// The default 16-bit tag.
pub type Tag16 = BitTag<16>;

impl<const N: usize> BitTag<N> {
    const VALID_WIDTH: () = assert!(N >= 1 && N <= 128, "BitTag width must be in 1..=128");

    /// Mask selecting the low `N` bits.
    const MASK: u128 = if N >= 128 { u128::MAX } else { (1u128 << N) - 1 };

    /// Create a tag from raw bits. Bits at or above `N` are discarded.
    pub fn new(bits: u128) -> Self {
        let () = Self::VALID_WIDTH;
        Self {
            bits: bits & Self::MASK,
        }
    }

    /// The all-zero tag.
    pub fn zero() -> Self {
        Self::new(0)
    }

    /// Raw bits.
    pub fn bits(&self) -> u128 {
        self.bits
    }

    /// Value of bit `index`. Out-of-range indices read as `false`.
    pub fn get(&self, index: usize) -> bool {
        index < N && (self.bits >> index) & 1 == 1
    }

    /// Set bit `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= N {
            return;
        }
        if value {
            self.bits |= 1u128 << index;
        } else {
            self.bits &= !(1u128 << index);
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.bits.count_ones()
    }
}

impl<const N: usize> Tag for BitTag<N> {
    fn width(&self) -> usize {
        N
    }

    fn hamming(&self, other: &Self) -> u32 {
        (self.bits ^ other.bits).count_ones()
    }
}

impl<const N: usize> fmt::Display for BitTag<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..N).rev() {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl<const N: usize> FromStr for BitTag<N> {
    type Err = TagParseError;

    /// Parse the form produced by `Display`: exactly `N` binary digits,
    /// most significant first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let got = s.chars().count();
        if got != N {
            return Err(TagParseError::InvalidLength { expected: N, got });
        }

        let mut bits = 0u128;
        for (at, digit) in s.chars().enumerate() {
            bits <<= 1;
            match digit {
                '0' => {}
                '1' => bits |= 1,
                _ => return Err(TagParseError::InvalidDigit { digit, at }),
            }
        }
        Ok(Self::new(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_masks_high_bits() {
        let tag = BitTag::<4>::new(0xFF);
        assert_eq!(tag.bits(), 0x0F);
    }

    #[test]
    fn display_most_significant_first() {
        assert_eq!(BitTag::<4>::new(0b0101).to_string(), "0101");
        assert_eq!(BitTag::<4>::new(0b1010).to_string(), "1010");
        assert_eq!(Tag16::zero().to_string(), "0000000000000000");
    }

    #[test]
    fn parse_display_form() {
        let tag: BitTag<4> = "1100".parse().unwrap();
        assert_eq!(tag.bits(), 0b1100);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            "101".parse::<BitTag<4>>(),
            Err(TagParseError::InvalidLength {
                expected: 4,
                got: 3
            })
        );
    }

    #[test]
    fn parse_rejects_non_binary_digit() {
        assert_eq!(
            "10x1".parse::<BitTag<4>>(),
            Err(TagParseError::InvalidDigit { digit: 'x', at: 2 })
        );
    }

    #[test]
    fn get_and_set() {
        let mut tag = BitTag::<8>::zero();
        tag.set(3, true);
        tag.set(7, true);
        assert!(tag.get(3));
        assert!(tag.get(7));
        assert!(!tag.get(0));
        tag.set(3, false);
        assert!(!tag.get(3));
        assert_eq!(tag.count_ones(), 1);
    }

    #[test]
    fn set_out_of_range_is_ignored() {
        let mut tag = BitTag::<4>::zero();
        tag.set(4, true);
        assert_eq!(tag, BitTag::zero());
        assert!(!tag.get(100));
    }

    #[test]
    fn hamming_distance() {
        let a = BitTag::<4>::new(0b0101);
        let b = BitTag::<4>::new(0b1010);
        assert_eq!(a.hamming(&b), 4);
        assert_eq!(a.hamming(&a), 0);
        assert_eq!(a.hamming(&BitTag::new(0b0100)), 1);
        assert_eq!(a.width(), 4);
    }

    #[test]
    fn full_width_tag() {
        let tag = BitTag::<128>::new(u128::MAX);
        assert_eq!(tag.count_ones(), 128);
        assert_eq!(tag.hamming(&BitTag::zero()), 128);
    }
}
