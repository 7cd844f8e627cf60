/// Largest-remainder (Hamilton) apportionment of `total` units.
///
/// `weights` must already be in priority order: ties on the fractional
/// remainder go to the lower index. Negative and non-finite weights count as
/// zero. If every weight is zero the units are split by count instead.
///
/// The returned shares always sum to exactly `total` when `weights` is non-empty.
pub fn largest_remainder(weights: &[f64], total: u32) -> Vec<u32> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }

    let clean: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() { w.max(0.0) } else { 0.0 })
        .collect();
    let sum: f64 = clean.iter().sum();

    let raw: Vec<f64> = if sum > 0.0 {
        clean.iter().map(|&w| total as f64 * w / sum).collect()
    } else {
        vec![total as f64 / n as f64; n]
    };

    let mut shares: Vec<u32> = raw.iter().map(|&r| (r.floor() as u32).min(total)).collect();
    let floored: u64 = shares.iter().map(|&s| s as u64).sum();

    // Rounding drift can only push the floors over by a unit or two; trim from the back.
    let mut excess = floored.saturating_sub(total as u64);
    for share in shares.iter_mut().rev() {
        if excess == 0 {
            break;
        }
        let take = excess.min(*share as u64);
        *share -= take as u32;
        excess -= take;
    }

    let mut remainder = (total as u64).saturating_sub(floored.min(total as u64));
    if remainder == 0 {
        return shares;
    }

    let mut by_fraction: Vec<usize> = (0..n).collect();
    // Stable: equal fractions keep priority order
    by_fraction.sort_by(|&a, &b| {
        let fa = raw[a] - raw[a].floor();
        let fb = raw[b] - raw[b].floor();
        fb.total_cmp(&fa)
    });

    for &i in by_fraction.iter().cycle() {
        if remainder == 0 {
            break;
        }
        shares[i] += 1;
        remainder -= 1;
    }

    shares
}

#[cfg(test)]
mod tests {
    use super::largest_remainder;

    #[test]
    fn equal_weights_give_extra_unit_to_first() {
        let shares = largest_remainder(&[10.0, 10.0, 10.0], 10);
        assert_eq!(shares, vec![4, 3, 3]);
    }

    #[test]
    fn largest_fraction_wins_the_remainder() {
        // raw = [4.5, 3.3, 2.2] -> floors [4, 3, 2], one spare unit to the 0.5
        let shares = largest_remainder(&[45.0, 33.0, 22.0], 10);
        assert_eq!(shares, vec![5, 3, 2]);
    }

    #[test]
    fn zero_total_weight_splits_by_count() {
        assert_eq!(largest_remainder(&[0.0], 5), vec![5]);
        assert_eq!(largest_remainder(&[0.0, 0.0, 0.0], 7), vec![3, 2, 2]);
    }

    #[test]
    fn more_entities_than_units() {
        let shares = largest_remainder(&[1.0; 8], 3);
        assert_eq!(shares.iter().sum::<u32>(), 3);
        assert_eq!(shares, vec![1, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn invalid_weights_count_as_zero() {
        let shares = largest_remainder(&[f64::NAN, -4.0, 2.0], 6);
        assert_eq!(shares, vec![0, 0, 6]);
    }

    #[test]
    fn empty_input() {
        assert!(largest_remainder(&[], 10).is_empty());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn shares_sum_to_total(
                weights in proptest::collection::vec(0.0f64..1e12, 1..200),
                total in 0u32..10_000,
            ) {
                let shares = largest_remainder(&weights, total);
                prop_assert_eq!(shares.iter().map(|&s| s as u64).sum::<u64>(), total as u64);
            }

            #[test]
            fn larger_weight_never_gets_fewer_units(
                mut weights in proptest::collection::vec(0.0f64..1e9, 2..100),
                total in 1u32..5_000,
            ) {
                weights.sort_by(|a, b| b.total_cmp(a));
                let shares = largest_remainder(&weights, total);
                for pair in shares.windows(2) {
                    prop_assert!(pair[0] >= pair[1]);
                }
            }
        }
    }
}
