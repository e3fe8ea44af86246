//! Bounded local search that trades players between two teams.

use courtside_core::{CategorySet, PlayerId, Weights};

/// Upper bound on improving swaps applied by a single rebalance.
pub const MAX_SWAP_ITERATIONS: usize = 300;

/// Two teams under construction together with their running weight sums.
#[derive(Clone, Debug, Default)]
pub(crate) struct TeamPair {
    pub(crate) members: [Vec<PlayerId>; 2],
    pub(crate) sums: [u64; 2],
}

impl TeamPair {
    pub(crate) fn push(&mut self, side: usize, player: PlayerId, weights: &Weights) {
        self.members[side].push(player);
        self.sums[side] += u64::from(weights.get(player));
    }

    pub(crate) fn diff(&self) -> u64 {
        self.sums[0].abs_diff(self.sums[1])
    }

    fn heavier_side(&self) -> usize {
        if self.sums[0] >= self.sums[1] {
            0
        } else {
            1
        }
    }
}

/// Swaps players between the teams until no single swap narrows the weight
/// gap or the iteration bound is hit.
///
/// Each iteration applies the first strictly improving swap found while
/// scanning heavier-team members against lighter-team members in index order.
/// When `category` is provided only players of equal marked status are
/// traded, which keeps the marked counts untouched. Returns the number of
/// swaps applied.
pub(crate) fn rebalance(
    pair: &mut TeamPair,
    weights: &Weights,
    category: Option<&CategorySet>,
) -> usize {
    let mut swaps = 0;
    while swaps < MAX_SWAP_ITERATIONS {
        let Some((heavy_index, light_index)) = first_improving_swap(pair, weights, category) else {
            break;
        };

        let heavy = pair.heavier_side();
        let light = 1 - heavy;
        let outgoing = pair.members[heavy][heavy_index];
        let incoming = pair.members[light][light_index];
        pair.members[heavy][heavy_index] = incoming;
        pair.members[light][light_index] = outgoing;

        let outgoing_weight = u64::from(weights.get(outgoing));
        let incoming_weight = u64::from(weights.get(incoming));
        pair.sums[heavy] = pair.sums[heavy] - outgoing_weight + incoming_weight;
        pair.sums[light] = pair.sums[light] - incoming_weight + outgoing_weight;
        swaps += 1;
    }
    swaps
}

fn first_improving_swap(
    pair: &TeamPair,
    weights: &Weights,
    category: Option<&CategorySet>,
) -> Option<(usize, usize)> {
    let heavy = pair.heavier_side();
    let light = 1 - heavy;
    let gap = i128::from(pair.sums[heavy]) - i128::from(pair.sums[light]);
    let current = gap.unsigned_abs();

    for (heavy_index, outgoing) in pair.members[heavy].iter().enumerate() {
        for (light_index, incoming) in pair.members[light].iter().enumerate() {
            if let Some(category) = category {
                if category.contains(*outgoing) != category.contains(*incoming) {
                    continue;
                }
            }

            let shift = i128::from(weights.get(*outgoing)) - i128::from(weights.get(*incoming));
            let candidate = (gap - 2 * shift).unsigned_abs();
            if candidate < current {
                return Some((heavy_index, light_index));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn weighted(pairs: &[(u64, u32)]) -> Weights {
        pairs
            .iter()
            .map(|(id, weight)| (PlayerId::new(*id), *weight))
            .collect()
    }

    fn pair_of(weights: &Weights, first: &[u64], second: &[u64]) -> TeamPair {
        let mut pair = TeamPair::default();
        for id in first {
            pair.push(0, PlayerId::new(*id), weights);
        }
        for id in second {
            pair.push(1, PlayerId::new(*id), weights);
        }
        pair
    }

    #[test]
    fn finds_the_swap_that_levels_seven_against_five() {
        let weights = weighted(&[(1, 4), (2, 3), (3, 3), (4, 2)]);
        let mut pair = pair_of(&weights, &[1, 2], &[3, 4]);
        assert_eq!(pair.sums, [7, 5]);

        let swaps = rebalance(&mut pair, &weights, None);

        assert_eq!(swaps, 1);
        assert_eq!(pair.sums, [6, 6]);
        assert_eq!(pair.diff(), 0);
    }

    #[test]
    fn stops_at_local_optimum() {
        let weights = weighted(&[(1, 5), (2, 1)]);
        let mut pair = pair_of(&weights, &[1], &[2]);

        let swaps = rebalance(&mut pair, &weights, None);

        assert_eq!(swaps, 0, "swapping 5 for 1 only mirrors the gap");
        assert_eq!(pair.diff(), 4);
    }

    #[test]
    fn keeps_improving_below_the_tolerance() {
        let weights = weighted(&[(1, 5), (2, 6), (3, 4), (4, 3)]);
        let mut pair = pair_of(&weights, &[1, 2], &[3, 4]);
        assert_eq!(pair.diff(), 4);

        let swaps = rebalance(&mut pair, &weights, None);

        assert_eq!(swaps, 2, "the first swap only narrows the gap to 2");
        assert_eq!(pair.diff(), 0);
    }

    #[test]
    fn category_swaps_keep_marked_players_in_place() {
        let weights = weighted(&[(1, 9), (2, 1), (3, 1), (4, 1)]);
        let category: CategorySet = [PlayerId::new(1)].into_iter().collect();
        let mut pair = pair_of(&weights, &[1, 2], &[3, 4]);

        let swaps = rebalance(&mut pair, &weights, Some(&category));

        assert_eq!(swaps, 0);
        assert!(pair.members[0].contains(&PlayerId::new(1)));
    }

    proptest! {
        #[test]
        fn local_search_never_widens_the_gap(
            first in prop::collection::vec(1u32..20, 0..10),
            second in prop::collection::vec(1u32..20, 0..10),
        ) {
            let mut weights = Weights::new();
            let mut pair = TeamPair::default();
            for (offset, weight) in first.iter().enumerate() {
                let player = PlayerId::new(offset as u64);
                weights.insert(player, *weight);
                pair.push(0, player, &weights);
            }
            for (offset, weight) in second.iter().enumerate() {
                let player = PlayerId::new(100 + offset as u64);
                weights.insert(player, *weight);
                pair.push(1, player, &weights);
            }
            let before = pair.diff();
            let sizes = [pair.members[0].len(), pair.members[1].len()];

            let swaps = rebalance(&mut pair, &weights, None);

            prop_assert!(swaps <= MAX_SWAP_ITERATIONS);
            prop_assert!(pair.diff() <= before);
            prop_assert_eq!(sizes, [pair.members[0].len(), pair.members[1].len()]);
            prop_assert_eq!(pair.sums[0], weights.total(&pair.members[0]));
            prop_assert_eq!(pair.sums[1], weights.total(&pair.members[1]));
        }

        #[test]
        fn matches_a_plain_first_improvement_loop(
            first in prop::collection::vec(1u32..12, 1..6),
            second in prop::collection::vec(1u32..12, 1..6),
        ) {
            let mut weights = Weights::new();
            let mut pair = TeamPair::default();
            let mut teams = [Vec::new(), Vec::new()];
            for (side, values) in [(0, &first), (1, &second)] {
                for (offset, weight) in values.iter().enumerate() {
                    let player = PlayerId::new(side as u64 * 100 + offset as u64);
                    weights.insert(player, *weight);
                    pair.push(side, player, &weights);
                    teams[side].push(*weight);
                }
            }

            let swaps = rebalance(&mut pair, &weights, None);
            let (expected_swaps, expected_diff) = plain_local_search(teams);

            prop_assert_eq!(swaps, expected_swaps);
            prop_assert_eq!(pair.diff(), expected_diff);
        }
    }

    /// Recomputes both sums from scratch on every iteration.
    fn plain_local_search(mut teams: [Vec<u32>; 2]) -> (usize, u64) {
        let sum = |team: &[u32]| team.iter().map(|weight| u64::from(*weight)).sum::<u64>();
        let mut swaps = 0;
        'search: while swaps < MAX_SWAP_ITERATIONS {
            let heavy = usize::from(sum(&teams[0]) < sum(&teams[1]));
            let light = 1 - heavy;
            let current = sum(&teams[heavy]) - sum(&teams[light]);
            for i in 0..teams[heavy].len() {
                for j in 0..teams[light].len() {
                    let mut heavier = teams[heavy].clone();
                    let mut lighter = teams[light].clone();
                    std::mem::swap(&mut heavier[i], &mut lighter[j]);
                    if sum(&heavier).abs_diff(sum(&lighter)) < current {
                        teams[heavy] = heavier;
                        teams[light] = lighter;
                        swaps += 1;
                        continue 'search;
                    }
                }
            }
            break;
        }
        (swaps, sum(&teams[0]).abs_diff(sum(&teams[1])))
    }
}
