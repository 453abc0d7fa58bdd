//! Transitive closure of the tightness graph
//!
//! One bit row per category: bit `a` of row `b` is set iff `a` binds
//! strictly tighter than `b`.

use super::CategoryId;

/// Fixed-size bit set over category indices
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(64)],
        }
    }

    #[inline]
    pub fn insert(
        &mut self,
        bit: usize,
    ) -> bool {
        let (word, mask) = (bit / 64, 1u64 << (bit % 64));
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    #[inline]
    pub fn contains(
        &self,
        bit: usize,
    ) -> bool {
        self.words
            .get(bit / 64)
            .is_some_and(|word| word & (1u64 << (bit % 64)) != 0)
    }

    pub fn union_with(
        &mut self,
        other: &BitSet,
    ) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (word, bits) in self.words.iter_mut().zip(&other.words) {
            *word |= bits;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| index * 64 + bit)
        })
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }
}

/// Reachability rows computed from the direct "tighter than" edges
#[derive(Debug, Clone)]
pub struct Closure {
    rows: Vec<BitSet>,
}

impl Closure {
    /// `above[b]` lists the categories directly tighter than `b`
    pub fn compute<E: AsRef<[CategoryId]>>(above: &[E]) -> Self {
        let count = above.len();
        let mut rows = Vec::with_capacity(count);
        let mut stack = Vec::new();

        for start in 0..count {
            let mut row = BitSet::with_capacity(count);
            stack.clear();
            stack.extend(above[start].as_ref().iter().map(|c| c.index()));
            while let Some(next) = stack.pop() {
                if row.insert(next) {
                    stack.extend(above[next].as_ref().iter().map(|c| c.index()));
                }
            }
            rows.push(row);
        }

        Self { rows }
    }

    /// `a` binds strictly tighter than `b`
    #[inline]
    pub fn tighter(
        &self,
        a: CategoryId,
        b: CategoryId,
    ) -> bool {
        self.rows
            .get(b.index())
            .is_some_and(|row| row.contains(a.index()))
    }

    /// Every category strictly tighter than `b`
    pub fn row(
        &self,
        b: CategoryId,
    ) -> Option<&BitSet> {
        self.rows.get(b.index())
    }
}
