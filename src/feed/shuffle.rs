use rand::Rng;

/// Return a uniformly shuffled copy of `items`.
///
/// Fisher–Yates over a clone: walking from the back, each position swaps
/// with a uniformly chosen index at or before it. With an unbiased RNG every
/// one of the n! orderings is equally likely. The input slice is untouched.
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use reelfeed::feed::shuffle;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let mixed = shuffle(&[1, 2, 3, 4], &mut rng);
/// assert_eq!(mixed.len(), 4);
/// ```
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.gen_range(0..=i);
        out.swap(i, j);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_and_single() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(shuffle::<u8, _>(&[], &mut rng).is_empty());
        assert_eq!(shuffle(&["only"], &mut rng), vec!["only"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let mut rng = StdRng::seed_from_u64(2);
        let input = vec![1, 2, 3, 4, 5];
        let _ = shuffle(&input, &mut rng);
        assert_eq!(input, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_same_seed_same_order() {
        let input: Vec<u32> = (0..20).collect();
        let a = shuffle(&input, &mut StdRng::seed_from_u64(42));
        let b = shuffle(&input, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_fixed_point_bias() {
        // Each element should land in each position ~1/n of the time.
        const N: usize = 5;
        const ROUNDS: usize = 20_000;
        let mut rng = StdRng::seed_from_u64(0xfeed);
        let input: Vec<usize> = (0..N).collect();
        let mut counts = [[0usize; N]; N];
        for _ in 0..ROUNDS {
            for (pos, &item) in shuffle(&input, &mut rng).iter().enumerate() {
                counts[item][pos] += 1;
            }
        }
        let expected = ROUNDS / N;
        for row in counts {
            for count in row {
                let diff = count.abs_diff(expected);
                assert!(diff < expected / 10, "count {count} too far from {expected}");
            }
        }
    }

    #[test]
    fn test_all_orderings_reachable() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2_000 {
            seen.insert(shuffle(&[1, 2, 3], &mut rng));
        }
        assert_eq!(seen.len(), 6);
    }

    proptest! {
        #[test]
        fn shuffle_is_permutation(items in proptest::collection::vec(0i64..50, 0..40), seed: u64) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut out = shuffle(&items, &mut rng);
            let mut sorted = items.clone();
            out.sort_unstable();
            sorted.sort_unstable();
            prop_assert_eq!(out, sorted);
        }
    }
}
