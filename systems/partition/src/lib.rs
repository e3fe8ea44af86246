#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Balancing system that partitions present players into two or three teams.
//!
//! Three-team sessions are dealt round-robin from a shuffled roster. Two-team
//! sessions spread marked players first, then place the remaining players
//! heaviest-first onto the lighter team while honoring the target sizes, and
//! finish with a bounded local search when the weight gap exceeds the
//! configured tolerance. An odd player may be moved to the substitutes.

mod rebalance;

use courtside_core::{
    BalanceConfig, CategorySet, Command, Player, PlayerId, TeamCount, Teams, Weights,
};
use courtside_system_weighting::compute_weights;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

pub use rebalance::MAX_SWAP_ITERATIONS;

use crate::rebalance::{rebalance, TeamPair};

/// How well the weight balance of a partition matched the configured tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceOutcome {
    /// Weight balancing does not apply to three-team partitions.
    NotApplicable,
    /// The final weight difference is within the tolerance.
    WithinTolerance {
        /// Absolute weight difference between the two teams.
        diff: u64,
    },
    /// Local search reached an optimum that still exceeds the tolerance.
    AboveTolerance {
        /// Absolute weight difference between the two teams.
        diff: u64,
        /// Weight difference the configuration tolerates.
        allowed: u64,
    },
}

/// Teams produced by a partition request together with its balance report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    /// Players assigned to each slot.
    pub teams: Teams,
    /// Weight balance of the two playing teams once substitutes are set aside.
    pub balance: BalanceOutcome,
}

/// Partitions the present players according to the provided configuration.
///
/// Absent players are ignored; an empty roster yields empty slots. The union
/// of the returned slots always equals the present-player set.
pub fn partition_teams<R>(
    players: &[Player],
    weights: &Weights,
    config: &BalanceConfig,
    category: &CategorySet,
    rng: &mut R,
) -> Partition
where
    R: Rng + ?Sized,
{
    let mut present: Vec<PlayerId> = players
        .iter()
        .filter(|player| player.is_present())
        .map(Player::id)
        .collect();
    present.shuffle(rng);

    let partition = match config.team_count {
        TeamCount::Three => Partition {
            teams: deal_round_robin(present),
            balance: BalanceOutcome::NotApplicable,
        },
        TeamCount::Two => split_two(present, weights, config, category, rng),
    };

    debug_assert!(partition.teams.is_disjoint(), "partition assigns a player twice");
    partition
}

fn deal_round_robin(shuffled: Vec<PlayerId>) -> Teams {
    let mut slots: [Vec<PlayerId>; 3] = Default::default();
    for (index, player) in shuffled.into_iter().enumerate() {
        slots[index % 3].push(player);
    }
    let [team1, team2, team3] = slots;
    Teams::new(team1, team2, team3, Vec::new())
}

fn split_two<R>(
    shuffled: Vec<PlayerId>,
    weights: &Weights,
    config: &BalanceConfig,
    category: &CategorySet,
    rng: &mut R,
) -> Partition
where
    R: Rng + ?Sized,
{
    let total = shuffled.len();
    let (marked, mut normal): (Vec<PlayerId>, Vec<PlayerId>) = if config.balance_category {
        shuffled
            .into_iter()
            .partition(|player| category.contains(*player))
    } else {
        (Vec::new(), shuffled)
    };

    let mut pair = TeamPair::default();
    for (index, player) in marked.into_iter().enumerate() {
        pair.push(index % 2, player, weights);
    }
    if config.balance_category {
        even_out_marked(&mut pair, weights, category);
    }

    let targets = [total.div_ceil(2), total / 2];
    normal.shuffle(rng);
    normal.sort_by(|lhs, rhs| weights.get(*rhs).cmp(&weights.get(*lhs)));
    for player in normal {
        let side = next_side(&pair, targets);
        pair.push(side, player, weights);
    }

    let allowed = config.max_allowed_diff();
    if pair.diff() > allowed {
        let swap_category = config.balance_category.then_some(category);
        let swaps = rebalance(&mut pair, weights, swap_category);
        debug!(swaps, diff = pair.diff(), allowed, "local search finished");
    }

    let TeamPair {
        members: [mut team1, mut team2],
        ..
    } = pair;
    let mut subs = Vec::new();
    if total % 2 == 1 && config.allow_sub {
        let larger = if team1.len() > team2.len() {
            &mut team1
        } else {
            &mut team2
        };
        subs.extend(larger.pop());
    }

    let diff = weights.total(&team1).abs_diff(weights.total(&team2));
    let balance = if diff <= allowed {
        BalanceOutcome::WithinTolerance { diff }
    } else {
        BalanceOutcome::AboveTolerance { diff, allowed }
    };

    Partition {
        teams: Teams::new(team1, team2, Vec::new(), subs),
        balance,
    }
}

/// Moves marked players from the team holding more of them until the counts
/// differ by at most one.
fn even_out_marked(pair: &mut TeamPair, weights: &Weights, category: &CategorySet) {
    loop {
        let counts = [
            category.count_in(&pair.members[0]),
            category.count_in(&pair.members[1]),
        ];
        if counts[0].abs_diff(counts[1]) <= 1 {
            return;
        }

        let from = if counts[0] > counts[1] { 0 } else { 1 };
        let Some(position) = pair.members[from]
            .iter()
            .rposition(|player| category.contains(*player))
        else {
            return;
        };

        let player = pair.members[from].remove(position);
        pair.sums[from] -= u64::from(weights.get(player));
        pair.push(1 - from, player, weights);
    }
}

fn next_side(pair: &TeamPair, targets: [usize; 2]) -> usize {
    let first_full = pair.members[0].len() >= targets[0];
    let second_full = pair.members[1].len() >= targets[1];
    if first_full && !second_full {
        1
    } else if second_full && !first_full {
        0
    } else if pair.sums[1] < pair.sums[0] {
        1
    } else {
        0
    }
}

/// Seeded balancing system that turns partition requests into session commands.
#[derive(Debug)]
pub struct Partitioner {
    rng: ChaCha8Rng,
}

impl Partitioner {
    /// Creates a partitioner whose shuffles are reproducible from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a partitioner seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Computes weights, partitions the present players and emits the commands
    /// that install the result into the session.
    ///
    /// The returned outcome reports whether the weight tolerance was met; an
    /// unmet tolerance is an accepted heuristic limitation and is logged.
    pub fn handle(
        &mut self,
        players: &[Player],
        config: &BalanceConfig,
        category: &CategorySet,
        out: &mut Vec<Command>,
    ) -> BalanceOutcome {
        let weights = compute_weights(players, config.weighted);
        let Partition { teams, balance } =
            partition_teams(players, &weights, config, category, &mut self.rng);

        if let BalanceOutcome::AboveTolerance { diff, allowed } = balance {
            warn!(diff, allowed, "partition exceeds the weight tolerance");
        }
        debug!(
            team_count = config.team_count.get(),
            present = weights.len(),
            subs = teams.subs().len(),
            "partition computed"
        );

        out.push(Command::SetTeamCount {
            count: config.team_count,
        });
        out.push(Command::AssignTeams { teams });
        balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_core::PlayerStats;

    fn present_roster(count: u64) -> Vec<Player> {
        (0..count)
            .map(|id| Player::new(PlayerId::new(id), format!("p{id}")).with_presence(true))
            .collect()
    }

    #[test]
    fn seven_players_leave_one_substitute() {
        let players = present_roster(7);
        let weights = compute_weights(&players, false);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let partition = partition_teams(
            &players,
            &weights,
            &BalanceConfig::default(),
            &CategorySet::new(),
            &mut rng,
        );

        assert_eq!(partition.teams.team1().len(), 3);
        assert_eq!(partition.teams.team2().len(), 3);
        assert_eq!(partition.teams.subs().len(), 1);
        assert!(partition.teams.team3().is_empty());
    }

    #[test]
    fn odd_roster_without_subs_keeps_everyone_playing() {
        let players = present_roster(5);
        let weights = compute_weights(&players, false);
        let config = BalanceConfig {
            allow_sub: false,
            ..BalanceConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let partition =
            partition_teams(&players, &weights, &config, &CategorySet::new(), &mut rng);

        assert_eq!(partition.teams.team1().len(), 3);
        assert_eq!(partition.teams.team2().len(), 2);
        assert!(partition.teams.subs().is_empty());
    }

    #[test]
    fn three_teams_deal_round_robin() {
        let players = present_roster(8);
        let weights = compute_weights(&players, false);
        let config = BalanceConfig {
            team_count: TeamCount::Three,
            ..BalanceConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let partition =
            partition_teams(&players, &weights, &config, &CategorySet::new(), &mut rng);

        assert_eq!(partition.teams.team1().len(), 3);
        assert_eq!(partition.teams.team2().len(), 3);
        assert_eq!(partition.teams.team3().len(), 2);
        assert!(partition.teams.subs().is_empty());
        assert_eq!(partition.balance, BalanceOutcome::NotApplicable);
    }

    #[test]
    fn empty_roster_produces_empty_slots() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let partition = partition_teams(
            &[],
            &Weights::new(),
            &BalanceConfig::default(),
            &CategorySet::new(),
            &mut rng,
        );
        assert!(partition.teams.is_empty());
        assert_eq!(partition.balance, BalanceOutcome::WithinTolerance { diff: 0 });
    }

    #[test]
    fn heaviest_players_land_on_opposite_teams() {
        let players: Vec<Player> = [(0, 10, 10), (1, 10, 9), (2, 10, 1), (3, 10, 0)]
            .into_iter()
            .map(|(id, games, wins)| {
                Player::new(PlayerId::new(id), format!("p{id}"))
                    .with_presence(true)
                    .with_stats(PlayerStats::new(games, wins))
            })
            .collect();
        let weights = compute_weights(&players, true);
        let config = BalanceConfig {
            weighted: true,
            ..BalanceConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let partition =
            partition_teams(&players, &weights, &config, &CategorySet::new(), &mut rng);

        let first_sum = weights.total(partition.teams.team1());
        let second_sum = weights.total(partition.teams.team2());
        assert_eq!(first_sum, 5);
        assert_eq!(second_sum, 5);
        assert_eq!(partition.balance, BalanceOutcome::WithinTolerance { diff: 0 });
    }

    #[test]
    fn marked_players_alternate_between_teams() {
        let players = present_roster(6);
        let category: CategorySet = [0, 1, 2].into_iter().map(PlayerId::new).collect();
        let weights = compute_weights(&players, false);
        let config = BalanceConfig {
            balance_category: true,
            ..BalanceConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let partition = partition_teams(&players, &weights, &config, &category, &mut rng);

        let first = category.count_in(partition.teams.team1());
        let second = category.count_in(partition.teams.team2());
        assert_eq!(first + second, 3);
        assert!(first.abs_diff(second) <= 1);
    }

    #[test]
    fn uneven_marked_split_is_corrected() {
        let weights = Weights::new();
        let category: CategorySet = [1, 2, 3].into_iter().map(PlayerId::new).collect();
        let mut pair = TeamPair::default();
        for id in [1, 2, 3] {
            pair.push(0, PlayerId::new(id), &weights);
        }

        even_out_marked(&mut pair, &weights, &category);

        assert_eq!(pair.members[0].len(), 2);
        assert_eq!(pair.members[1], vec![PlayerId::new(3)]);
        assert_eq!(pair.sums, [2, 1]);
    }

    #[test]
    fn handler_emits_team_count_then_assignment() {
        let players = present_roster(4);
        let mut partitioner = Partitioner::new(9);
        let mut commands = Vec::new();

        let outcome = partitioner.handle(
            &players,
            &BalanceConfig::default(),
            &CategorySet::new(),
            &mut commands,
        );

        assert_eq!(outcome, BalanceOutcome::WithinTolerance { diff: 0 });
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            Command::SetTeamCount {
                count: TeamCount::Two
            }
        );
        assert!(matches!(commands[1], Command::AssignTeams { .. }));
    }
}
