use std::iter::FromIterator;

const BITS_PER_WORD: usize = u64::BITS as usize;

/// A fixed-length sequence of bits, one per element of a property storage. Used for selecting elements that are
/// to be removed (`PropertyStorage::filter_resize`, `PropertyContainer::delete_elements`)
///
/// ```
/// # use propstore_core::math::BitMask;
/// let mask = [false, true, true, false].iter().copied().collect::<BitMask>();
/// assert_eq!(mask.len(), 4);
/// assert_eq!(mask.count_ones(), 2);
/// assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![1, 2]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitMask {
    words: Vec<u64>,
    len: usize,
}

impl BitMask {
    /// Creates a new `BitMask` with `len` bits, all of them cleared
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; (len + BITS_PER_WORD - 1) / BITS_PER_WORD],
            len,
        }
    }

    /// Creates a new `BitMask` with `len` bits, all of them set
    pub fn all_set(len: usize) -> Self {
        let mut mask = Self::new(len);
        mask.words.iter_mut().for_each(|word| *word = u64::MAX);
        mask.clear_unused_bits();
        mask
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the bit at `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn test(&self, index: usize) -> bool {
        assert!(index < self.len, "Bit index {} out of bounds", index);
        (self.words[index / BITS_PER_WORD] >> (index % BITS_PER_WORD)) & 1 == 1
    }

    /// Sets the bit at `index` to `value`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < self.len, "Bit index {} out of bounds", index);
        let word = &mut self.words[index / BITS_PER_WORD];
        let bit = 1u64 << (index % BITS_PER_WORD);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Number of cleared bits
    pub fn count_zeros(&self) -> usize {
        self.len - self.count_ones()
    }

    /// Is any bit set?
    pub fn any(&self) -> bool {
        self.words.iter().any(|word| *word != 0)
    }

    /// Iterator over all bits in order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |index| self.test(index))
    }

    /// Iterator over the indices of all set bits, in ascending order
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter_words_matching(false)
    }

    /// Iterator over the indices of all cleared bits, in ascending order
    pub fn iter_zeros(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter_words_matching(true)
    }

    fn iter_words_matching(&self, invert: bool) -> impl Iterator<Item = usize> + '_ {
        let len = self.len;
        self.words
            .iter()
            .enumerate()
            .flat_map(move |(word_index, word)| {
                let mut bits = if invert { !*word } else { *word };
                std::iter::from_fn(move || {
                    if bits == 0 {
                        return None;
                    }
                    let bit = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    Some(word_index * BITS_PER_WORD + bit)
                })
            })
            .take_while(move |index| *index < len)
    }

    fn clear_unused_bits(&mut self) {
        let used_bits_in_last_word = self.len % BITS_PER_WORD;
        if used_bits_in_last_word != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used_bits_in_last_word) - 1;
            }
        }
    }
}

impl FromIterator<bool> for BitMask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut mask = BitMask::default();
        for bit in iter {
            if mask.len % BITS_PER_WORD == 0 {
                mask.words.push(0);
            }
            if bit {
                mask.words[mask.len / BITS_PER_WORD] |= 1u64 << (mask.len % BITS_PER_WORD);
            }
            mask.len += 1;
        }
        mask
    }
}

impl From<&[bool]> for BitMask {
    fn from(bits: &[bool]) -> Self {
        bits.iter().copied().collect()
    }
}
