// Traversal — which dataset index is admitted into the buffer next
//
// Shuffled: a random permutation of all indices is consumed front to back.
// When it runs dry a fresh permutation of *all* indices replaces it, so an
// index that was just evicted (or is still resident) can come straight back.
//
// Sequential: (last admitted + 1) mod len, starting from 0.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

/// Order in which dataset indices are admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    Shuffled,
    Sequential,
}

impl TraversalOrder {
    pub fn from_shuffle(shuffle: bool) -> Self {
        if shuffle {
            TraversalOrder::Shuffled
        } else {
            TraversalOrder::Sequential
        }
    }
}

/// Cursor over the indices of a dataset of length `len`.
#[derive(Debug, Clone)]
pub struct Traversal {
    order: TraversalOrder,
    len: usize,
    /// Unconsumed tail of the current permutation (shuffled mode only).
    pending: VecDeque<usize>,
    last: Option<usize>,
}

impl Traversal {
    /// Start a traversal. In shuffled mode this draws the first permutation.
    pub fn new<R: Rng + ?Sized>(order: TraversalOrder, len: usize, rng: &mut R) -> Self {
        let mut traversal = Self {
            order,
            len,
            pending: VecDeque::new(),
            last: None,
        };
        if order == TraversalOrder::Shuffled {
            traversal.reshuffle(rng);
        }
        traversal
    }

    fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut indices: Vec<usize> = (0..self.len).collect();
        indices.shuffle(rng);
        self.pending = indices.into();
    }

    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    /// Most recently committed index.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Indices left in the current permutation before a reshuffle.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// The index that would be admitted next, without consuming it.
    ///
    /// In shuffled mode an exhausted permutation is regenerated here. Returns
    /// `None` only for an empty dataset.
    pub fn peek<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        match self.order {
            TraversalOrder::Shuffled => {
                if self.pending.is_empty() {
                    log::debug!("traversal exhausted, reshuffling {} indices", self.len);
                    self.reshuffle(rng);
                }
                self.pending.front().copied()
            }
            TraversalOrder::Sequential => Some(self.last.map_or(0, |l| (l + 1) % self.len)),
        }
    }

    /// Consume `index`, which must be the value last returned by `peek`.
    pub fn commit(&mut self, index: usize) {
        if self.order == TraversalOrder::Shuffled {
            debug_assert_eq!(self.pending.front(), Some(&index));
            self.pending.pop_front();
        }
        self.last = Some(index);
    }

    /// `peek` followed by `commit`.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let index = self.peek(rng)?;
        self.commit(index);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sequential_wraps_around() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut t = Traversal::new(TraversalOrder::Sequential, 3, &mut rng);
        let seen: Vec<usize> = (0..7).filter_map(|_| t.advance(&mut rng)).collect();
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn shuffled_is_a_permutation_per_pass() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut t = Traversal::new(TraversalOrder::Shuffled, 10, &mut rng);
        assert_eq!(t.remaining(), 10);
        for _ in 0..3 {
            let mut pass: Vec<usize> = (0..10).filter_map(|_| t.advance(&mut rng)).collect();
            pass.sort_unstable();
            assert_eq!(pass, (0..10).collect::<Vec<_>>());
        }
    }

    #[test]
    fn peek_does_not_consume() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut t = Traversal::new(TraversalOrder::Shuffled, 4, &mut rng);
        let a = t.peek(&mut rng);
        let b = t.peek(&mut rng);
        assert_eq!(a, b);
        assert_eq!(t.remaining(), 4);
        t.commit(a.unwrap());
        assert_eq!(t.remaining(), 3);
        assert_eq!(t.last(), a);
    }

    #[test]
    fn empty_dataset_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut t = Traversal::new(TraversalOrder::Shuffled, 0, &mut rng);
        assert_eq!(t.advance(&mut rng), None);
        let mut t = Traversal::new(TraversalOrder::Sequential, 0, &mut rng);
        assert_eq!(t.advance(&mut rng), None);
    }

    #[test]
    fn from_shuffle_flag() {
        assert_eq!(TraversalOrder::from_shuffle(true), TraversalOrder::Shuffled);
        assert_eq!(TraversalOrder::from_shuffle(false), TraversalOrder::Sequential);
    }
}
