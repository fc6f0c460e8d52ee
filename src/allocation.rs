//! Proportional allocation of whole users across weighted categories
//!
//! Each key receives `floor(total * share / sum_of_shares)`; the users lost to
//! flooring are then given to the first key holding the largest share, so the
//! parts always add back up to the total and none can go negative.

/// Split `total` across `shares` (percentages, any scale).
///
/// Output order follows input order. An empty share list yields an empty
/// result; a zero total or all-zero shares yield zeros.
pub fn allocate<K: Copy>(total: u64, shares: &[(K, f64)]) -> Vec<(K, u64)> {
    if shares.is_empty() {
        return Vec::new();
    }

    let share_sum: f64 = shares.iter().map(|&(_, s)| s.max(0.0)).sum();
    if total == 0 || share_sum <= 0.0 {
        return shares.iter().map(|&(k, _)| (k, 0)).collect();
    }

    let mut parts: Vec<(K, u64)> = shares
        .iter()
        .map(|&(k, share)| {
            let raw = total as f64 * share.max(0.0) / share_sum;
            (k, (raw.floor() as u64).min(total))
        })
        .collect();

    let assigned: u64 = parts.iter().map(|&(_, n)| n).sum();
    if assigned < total {
        parts[largest_share_index(shares)].1 += total - assigned;
    } else if assigned > total {
        // Only reachable through float error on huge totals; take the excess
        // back from the largest parts first.
        let mut excess = assigned - total;
        let mut order: Vec<usize> = (0..parts.len()).collect();
        order.sort_by(|&a, &b| parts[b].1.cmp(&parts[a].1));
        for idx in order {
            let take = excess.min(parts[idx].1);
            parts[idx].1 -= take;
            excess -= take;
            if excess == 0 {
                break;
            }
        }
    }

    parts
}

/// Index of the first entry with the largest share
fn largest_share_index<K>(shares: &[(K, f64)]) -> usize {
    let mut best = 0;
    for (i, (_, share)) in shares.iter().enumerate() {
        if *share > shares[best].1 {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_of<K>(parts: &[(K, u64)]) -> u64 {
        parts.iter().map(|(_, n)| n).sum()
    }

    #[test]
    fn test_exact_split() {
        let parts = allocate(100, &[(3u32, 30.0), (4, 25.0), (5, 45.0)]);
        assert_eq!(parts, vec![(3, 30), (4, 25), (5, 45)]);
    }

    #[test]
    fn test_remainder_goes_to_largest_share() {
        // 10 / 3 floors to 3 each; the lost user lands on the first of the ties
        let parts = allocate(10, &[(1u32, 100.0 / 3.0), (2, 100.0 / 3.0), (3, 100.0 / 3.0)]);
        assert_eq!(parts, vec![(1, 4), (2, 3), (3, 3)]);

        let parts = allocate(7, &[('a', 20.0), ('b', 50.0), ('c', 30.0)]);
        // floors: 1, 3, 2 -> remainder 1 to 'b'
        assert_eq!(parts, vec![('a', 1), ('b', 4), ('c', 2)]);
    }

    #[test]
    fn test_empty_and_zero() {
        let empty: Vec<(u32, f64)> = Vec::new();
        assert!(allocate(50, &empty).is_empty());

        assert_eq!(allocate(0, &[(1u32, 60.0), (2, 40.0)]), vec![(1, 0), (2, 0)]);
        assert_eq!(allocate(9, &[(1u32, 0.0), (2, 0.0)]), vec![(1, 0), (2, 0)]);
    }

    #[test]
    fn test_shares_not_summing_to_100_scale_proportionally() {
        let parts = allocate(90, &[(1u32, 10.0), (2, 20.0)]);
        assert_eq!(parts, vec![(1, 30), (2, 60)]);
    }

    #[test]
    fn test_conservation_across_many_totals() {
        let shares = [(3u32, 30.0), (4, 25.0), (5, 15.0), (6, 10.0), (8, 10.0), (10, 10.0)];
        let slabs: Vec<(u64, f64)> = [1000u64, 2000, 5000, 10000, 15000, 20000, 25000, 50000]
            .iter()
            .map(|&s| (s, 12.5))
            .collect();

        for total in (0..500).chain([1_000_003, 987_654_321]) {
            let by_duration = allocate(total, &shares);
            assert_eq!(total_of(&by_duration), total);

            for &(duration, users) in &by_duration {
                let by_slab = allocate(users, &slabs);
                assert_eq!(total_of(&by_slab), users);

                let slots: Vec<(u32, f64)> = (1..=duration).map(|s| (s, 100.0 / duration as f64)).collect();
                for &(_, slab_users) in &by_slab {
                    let by_slot = allocate(slab_users, &slots);
                    assert_eq!(total_of(&by_slot), slab_users);
                }
            }
        }
    }

    #[test]
    fn test_single_key_takes_everything() {
        assert_eq!(allocate(17, &[(1u32, 100.0)]), vec![(1, 17)]);
        assert_eq!(allocate(17, &[(1u32, 5.0)]), vec![(1, 17)]);
    }
}
