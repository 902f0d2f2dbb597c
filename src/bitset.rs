//! Compact bitset over taxon indices.
//!
//! # Overview
//! One side of a split is a set of taxa. Each bit position corresponds to a
//! taxon index (matrix row), so for taxa [A, B, C, D]:
//! - Side {A, C} → bitset `0b0101` (bits 0 and 2 set)
//! - Side {B, C, D} → bitset `0b1110` (bits 1, 2, 3 set)

/// A compact bitset recording which taxa lie on one side of a split.
///
/// Bits are stored in `Vec<u64>` words, 64 taxa per word, so any number of
/// taxa is supported.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// An empty set with room for `taxa` bits.
    ///
    /// # Example
    /// ```
    /// # use quartet_nj::bitset::Bitset;
    /// // 100 taxa need 2 words (128 bits)
    /// let bs = Bitset::for_taxa(100);
    /// assert_eq!(bs.0.len(), 2);
    /// ```
    pub fn for_taxa(taxa: usize) -> Self {
        Bitset(vec![0u64; taxa.div_ceil(64)])
    }

    /// Set containing exactly the given taxa.
    pub fn from_taxa<I: IntoIterator<Item = usize>>(taxa: usize, members: I) -> Self {
        let mut bs = Bitset::for_taxa(taxa);
        for idx in members {
            bs.set(idx);
        }
        bs
    }

    /// Adds taxon `idx` to the set.
    ///
    /// # Example
    /// ```
    /// # use quartet_nj::bitset::Bitset;
    /// let mut bs = Bitset::for_taxa(8);
    /// bs.set(0);
    /// bs.set(5);
    /// assert_eq!(bs.0[0], 0b00100001);
    /// ```
    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6; // idx / 64
        let bit = idx & 63; // idx % 64
        self.0[word] |= 1u64 << bit;
    }

    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        let word = idx >> 6;
        let bit = idx & 63;
        self.0.get(word).is_some_and(|w| w & (1u64 << bit) != 0)
    }

    /// Number of taxa in the set.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Render the first `taxa` positions as `*` (member) or `.` (non-member).
    ///
    /// # Example
    /// ```
    /// # use quartet_nj::bitset::Bitset;
    /// let bs = Bitset::from_taxa(5, [1, 2]);
    /// assert_eq!(bs.to_mask(5), ".**..");
    /// ```
    pub fn to_mask(&self, taxa: usize) -> String {
        (0..taxa)
            .map(|i| if self.contains(i) { '*' } else { '.' })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basic() {
        let mut bs = Bitset::for_taxa(4);
        bs.set(0);
        bs.set(2);
        assert_eq!(bs.0[0], 0b0101);
        assert!(bs.contains(2));
        assert!(!bs.contains(1));
        assert!(!bs.contains(1000));
    }

    #[test]
    fn test_count_ones() {
        let bs = Bitset::from_taxa(6, [0, 2, 5]);
        assert_eq!(bs.count_ones(), 3);
    }

    #[test]
    fn test_large_set() {
        // more than 64 taxa spans multiple words
        let bs = Bitset::from_taxa(128, [0, 63, 64, 127]);

        assert_eq!(bs.count_ones(), 4);
        assert_eq!(bs.0[0], 1u64 | (1u64 << 63));
        assert_eq!(bs.0[1], 1u64 | (1u64 << 63));
        assert_eq!(bs.to_mask(66), format!("*{}**.", ".".repeat(62)));
    }
}
