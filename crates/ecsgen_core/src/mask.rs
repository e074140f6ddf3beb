//! Mask widths and fixed-width bit vectors.
//!
//! Bit `i` of a [`BitMask`] is set iff the component (or tag) holding ID `i`
//! is a member. Widths come from a small ladder so per-archetype masks stay
//! cheap to store and compare; above the ladder, widths are rounded to a
//! multiple of 256 bits.

use std::fmt;

use serde::Serialize;

/// Built-in mask widths, smallest first.
const LADDER: [usize; 6] = [32, 64, 128, 256, 512, 1024];

/// Granularity of widths above the built-in ladder.
const WIDE_STEP: usize = 256;

const WORD_BITS: usize = u64::BITS as usize;

/// Number of bits in a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MaskWidth(usize);

impl MaskWidth {
    /// The smallest width on the ladder.
    pub const MIN: MaskWidth = MaskWidth(LADDER[0]);

    /// The smallest ladder width that can hold `required_slots` bits.
    ///
    /// Never fails: widths above 1024 bits are `required_slots` rounded up to
    /// the next multiple of 256.
    #[must_use]
    pub fn for_slots(required_slots: usize) -> Self {
        match LADDER.iter().find(|&&width| width >= required_slots) {
            Some(&width) => Self(width),
            None => Self(required_slots.div_ceil(WIDE_STEP) * WIDE_STEP),
        }
    }

    /// Width needed for a set of assigned IDs: `max + 1` slots.
    #[must_use]
    pub fn for_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let slots = ids.into_iter().max().map_or(0, |max| max as usize + 1);
        Self::for_slots(slots)
    }

    #[must_use]
    pub const fn bits(self) -> usize {
        self.0
    }

    /// Number of 64-bit words backing a mask of this width.
    #[must_use]
    pub const fn words(self) -> usize {
        self.0.div_ceil(WORD_BITS)
    }

    /// Whether this width is one of the built-in ladder widths.
    #[must_use]
    pub fn is_builtin(self) -> bool {
        LADDER.contains(&self.0)
    }
}

impl fmt::Display for MaskWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.0)
    }
}

/// A fixed-width bit vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BitMask {
    width: MaskWidth,
    words: Vec<u64>,
}

impl BitMask {
    /// An empty mask of the given width.
    #[must_use]
    pub fn new(width: MaskWidth) -> Self {
        Self {
            width,
            words: vec![0; width.words()],
        }
    }

    /// A mask with exactly the given bits set.
    ///
    /// Bits at or beyond the width are ignored.
    #[must_use]
    pub fn from_bits(width: MaskWidth, bits: impl IntoIterator<Item = u32>) -> Self {
        let mut mask = Self::new(width);
        for bit in bits {
            mask.set(bit);
        }
        mask
    }

    #[must_use]
    pub fn width(&self) -> MaskWidth {
        self.width
    }

    /// Set bit `bit`. Returns `false` if the bit is out of range.
    pub fn set(&mut self, bit: u32) -> bool {
        let bit = bit as usize;
        if bit >= self.width.bits() {
            return false;
        }
        self.words[bit / WORD_BITS] |= 1u64 << (bit % WORD_BITS);
        true
    }

    #[must_use]
    pub fn contains(&self, bit: u32) -> bool {
        let bit = bit as usize;
        bit < self.width.bits() && self.words[bit / WORD_BITS] & (1u64 << (bit % WORD_BITS)) != 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (index * WORD_BITS + bit) as u32)
        })
    }

    /// Whether every bit set in `self` is also set in `other`.
    ///
    /// Masks of different widths compare as if zero-extended.
    #[must_use]
    pub fn is_subset_of(&self, other: &BitMask) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, &w)| w & !other.words.get(i).copied().unwrap_or(0) == 0)
    }

    /// Whether `self` and `other` share at least one set bit.
    #[must_use]
    pub fn intersects(&self, other: &BitMask) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(&a, &b)| a & b != 0)
    }
}
