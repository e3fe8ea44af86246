#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure weighting system that turns attendance and history into fairness weights.

use std::cmp::Ordering;

use courtside_core::{Player, Weights};

/// Computes a fairness weight for every present player.
///
/// Uniform mode assigns weight 1 to everybody. Weighted mode ranks present
/// players by win rate using standard competition ranking (`1, 1, 3, 4`) and
/// maps rank `r` to `N - r + 1`, so the best tier weighs `N` and tied players
/// always share a weight. Absent players are ignored.
#[must_use]
pub fn compute_weights(players: &[Player], weighted: bool) -> Weights {
    let present: Vec<&Player> = players.iter().filter(|player| player.is_present()).collect();

    if !weighted {
        return present.iter().map(|player| (player.id(), 1)).collect();
    }

    let mut ranked = present;
    ranked.sort_by(|lhs, rhs| rhs.stats().cmp_win_rate(&lhs.stats()));

    let count = ranked.len();
    let mut weights = Weights::new();
    let mut rank = 1;
    for (index, player) in ranked.iter().enumerate() {
        if index > 0 {
            let ahead = ranked[index - 1];
            if ahead.stats().cmp_win_rate(&player.stats()) != Ordering::Equal {
                rank = index + 1;
            }
        }
        let weight = count - rank + 1;
        weights.insert(player.id(), u32::try_from(weight).unwrap_or(u32::MAX));
    }
    weights
}
