//! Shuffled-bag value generator
//!
//! Every face value 1-9 comes out exactly once per nine draws, in a random
//! order. Same idea as the "7-bag" piece randomiser in falling-block games.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Values dealt by the bag
pub const BAG_VALUES: [u32; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

#[derive(Debug, Clone)]
pub struct ValueBag {
    values: Vec<u32>,
    rng: Pcg32,
}

impl ValueBag {
    pub fn new(seed: u64) -> Self {
        Self {
            values: Vec::with_capacity(BAG_VALUES.len()),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Draw the next value, refilling and reshuffling when the bag is empty
    pub fn next_value(&mut self) -> u32 {
        if self.values.is_empty() {
            self.refill();
        }
        // Refill always leaves nine values behind
        self.values.pop().unwrap_or(BAG_VALUES[0])
    }

    /// Values left before the next refill
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Drop the current bag; the next draw starts a fresh one
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Fisher-Yates: walk down from the last index, swapping with a uniformly
    /// chosen index at or below it
    fn refill(&mut self) {
        self.values.clear();
        self.values.extend_from_slice(&BAG_VALUES);
        for i in (1..self.values.len()).rev() {
            let j = self.rng.random_range(0..=i);
            self.values.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted_draws(bag: &mut ValueBag, n: usize) -> Vec<u32> {
        let mut draws: Vec<u32> = (0..n).map(|_| bag.next_value()).collect();
        draws.sort_unstable();
        draws
    }

    #[test]
    fn test_fresh_bag_deals_each_value_once() {
        let mut bag = ValueBag::new(42);
        assert_eq!(sorted_draws(&mut bag, 9), BAG_VALUES);
        assert_eq!(bag.remaining(), 0);
    }

    #[test]
    fn test_reset_starts_a_new_bag() {
        let mut bag = ValueBag::new(42);
        bag.next_value();
        bag.next_value();
        bag.reset();
        assert_eq!(bag.remaining(), 0);
        assert_eq!(sorted_draws(&mut bag, 9), BAG_VALUES);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = ValueBag::new(5);
        let mut b = ValueBag::new(5);
        let seq_a: Vec<u32> = (0..27).map(|_| a.next_value()).collect();
        let seq_b: Vec<u32> = (0..27).map(|_| b.next_value()).collect();
        assert_eq!(seq_a, seq_b);
    }

    proptest! {
        #[test]
        fn prop_every_bag_is_a_permutation(seed in any::<u64>(), bags in 1usize..6) {
            let mut bag = ValueBag::new(seed);
            for _ in 0..bags {
                prop_assert_eq!(sorted_draws(&mut bag, 9), BAG_VALUES.to_vec());
            }
        }
    }
}
