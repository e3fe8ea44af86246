#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Courtside session engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the session executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, read roster snapshots, and respond
//! exclusively with new command batches.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Length of time the winner announcement stays visible after a declaration.
pub const WIN_NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

/// Countdown length applied to a fresh session, expressed in minutes.
pub const DEFAULT_TIMER_MINUTES: u32 = 10;

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Selects how many teams the session plays with; refused while a
    /// declaration is outstanding.
    SetTeamCount {
        /// Number of teams requested.
        count: TeamCount,
    },
    /// Replaces every team slot with the provided partition.
    AssignTeams {
        /// Partition produced by the balancing engine.
        teams: Teams,
    },
    /// Empties every team slot and resets in-flight match state.
    ClearTeams,
    /// Removes a single player from whichever slot currently holds them.
    RemoveFromTeams {
        /// Player to bench.
        player: PlayerId,
    },
    /// Exchanges the slots of two assigned players.
    SwapPlayers {
        /// First player taking part in the swap.
        first: PlayerId,
        /// Second player taking part in the swap.
        second: PlayerId,
    },
    /// Moves the score of one scoreboard side by a single point.
    AdjustScore {
        /// Scoreboard side whose score changes.
        side: Side,
        /// Direction of the adjustment.
        adjustment: ScoreAdjustment,
    },
    /// Declares the winner of the match currently being played.
    DeclareWinner {
        /// Active-pair side that won the match.
        side: Side,
    },
    /// Signals that the stat updates of the last declaration were committed.
    SettleDeclaration,
    /// Starts the countdown if it is not already running.
    StartTimer,
    /// Pauses the countdown.
    PauseTimer,
    /// Pauses the countdown and rewinds it to the provided length.
    ResetTimer {
        /// New countdown length in minutes.
        minutes: u32,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of wall time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the requested team count changed.
    TeamCountChanged {
        /// Team count that became active.
        count: TeamCount,
    },
    /// Confirms that a fresh partition replaced the previous teams.
    TeamsAssigned {
        /// Partition now held by the session.
        teams: Teams,
    },
    /// Confirms that every team slot was emptied.
    TeamsCleared,
    /// Confirms that a player was removed from a team slot.
    PlayerBenched {
        /// Player that was removed.
        player: PlayerId,
        /// Slot the player occupied before removal.
        slot: TeamSlot,
    },
    /// Confirms that two players exchanged slots.
    PlayersSwapped {
        /// First player of the swap and the slot it now occupies.
        first: (PlayerId, TeamSlot),
        /// Second player of the swap and the slot it now occupies.
        second: (PlayerId, TeamSlot),
    },
    /// Reports the score of a scoreboard side after an adjustment.
    ScoreChanged {
        /// Side whose score changed.
        side: Side,
        /// Score after the adjustment.
        score: u32,
    },
    /// Announces a declared match result awaiting its stat commit.
    MatchDeclared {
        /// Participants and outcome of the finished match.
        result: MatchResult,
    },
    /// Confirms that the outstanding declaration was settled.
    DeclarationSettled,
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of wall time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports the remaining countdown after whole seconds elapsed.
    TimerTicked {
        /// Whole seconds left on the countdown.
        remaining_secs: u32,
    },
    /// Announces that the countdown reached zero.
    TimerExpired,
    /// Announces that the winner notification expired.
    NotificationCleared,
    /// Reports that a command was refused by a session guard.
    CommandRejected {
        /// Specific reason the command was refused.
        reason: RejectionReason,
    },
}

/// Reasons the session may refuse a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RejectionReason {
    /// A previous declaration still has stat updates outstanding.
    #[error("a previous match declaration is still being recorded")]
    DeclarationInFlight,
    /// Neither active team holds any player.
    #[error("no match is currently being played")]
    NoActiveMatch,
    /// The referenced player is not assigned to any team slot.
    #[error("player {0} is not assigned to any team")]
    UnknownPlayer(PlayerId),
}

/// Opaque, stable identifier assigned to a roster member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Historical game and win counters of a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    games: u32,
    wins: u32,
}

impl PlayerStats {
    /// Creates counters from raw game and win totals.
    #[must_use]
    pub const fn new(games: u32, wins: u32) -> Self {
        Self { games, wins }
    }

    /// Number of recorded games.
    #[must_use]
    pub const fn games(&self) -> u32 {
        self.games
    }

    /// Number of recorded wins.
    #[must_use]
    pub const fn wins(&self) -> u32 {
        self.wins
    }

    /// Number of recorded losses, derived as games minus wins.
    #[must_use]
    pub const fn losses(&self) -> u32 {
        self.games.saturating_sub(self.wins)
    }

    /// Win rate in `0.0..=1.0`; players without games have a rate of zero.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins.min(self.games)) / f64::from(self.games)
        }
    }

    /// Compares win rates exactly, without floating point rounding.
    ///
    /// Two players with equal `wins / games` fractions compare equal even when
    /// their raw totals differ, e.g. `4/5` and `8/10`.
    #[must_use]
    pub fn cmp_win_rate(&self, other: &Self) -> Ordering {
        let (lhs_wins, lhs_games) = self.rate_fraction();
        let (rhs_wins, rhs_games) = other.rate_fraction();
        (lhs_wins * rhs_games).cmp(&(rhs_wins * lhs_games))
    }

    /// Returns the counters after applying the provided delta.
    #[must_use]
    pub const fn with_delta(&self, delta: &StatDelta) -> Self {
        Self {
            games: self.games.saturating_add(delta.games_delta),
            wins: self.wins.saturating_add(delta.wins_delta),
        }
    }

    fn rate_fraction(&self) -> (u64, u64) {
        if self.games == 0 {
            (0, 1)
        } else {
            (
                u64::from(self.wins.min(self.games)),
                u64::from(self.games),
            )
        }
    }
}

/// Roster member as supplied by the roster provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    #[serde(default)]
    present: bool,
    #[serde(flatten)]
    stats: PlayerStats,
}

impl Player {
    /// Creates an absent player without any recorded games.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            present: false,
            stats: PlayerStats::default(),
        }
    }

    /// Overrides the attendance flag.
    #[must_use]
    pub fn with_presence(mut self, present: bool) -> Self {
        self.present = present;
        self
    }

    /// Overrides the historical counters.
    #[must_use]
    pub fn with_stats(mut self, stats: PlayerStats) -> Self {
        self.stats = stats;
        self
    }

    /// Stable identifier of the player.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name of the player; names are not unique.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports whether the player attends the current session.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.present
    }

    /// Historical counters of the player.
    #[must_use]
    pub const fn stats(&self) -> PlayerStats {
        self.stats
    }

    /// Updates the attendance flag.
    pub fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    /// Replaces the historical counters.
    pub fn set_stats(&mut self, stats: PlayerStats) {
        self.stats = stats;
    }
}

/// Positive fairness weights keyed by player, recomputed per partition request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Weights {
    values: BTreeMap<PlayerId, u32>,
}

impl Weights {
    /// Weight reported for players missing from the mapping.
    pub const FALLBACK: u32 = 1;

    /// Creates an empty weight mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a weight to the provided player.
    pub fn insert(&mut self, player: PlayerId, weight: u32) {
        debug_assert!(weight > 0, "weights must be positive, got {weight} for {player}");
        let _ = self.values.insert(player, weight);
    }

    /// Weight of the provided player, falling back to [`Weights::FALLBACK`].
    #[must_use]
    pub fn get(&self, player: PlayerId) -> u32 {
        self.values.get(&player).copied().unwrap_or(Self::FALLBACK)
    }

    /// Sums the weights of the provided players.
    #[must_use]
    pub fn total<'a>(&self, players: impl IntoIterator<Item = &'a PlayerId>) -> u64 {
        players
            .into_iter()
            .map(|player| u64::from(self.get(*player)))
            .sum()
    }

    /// Number of players holding an explicit weight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether no explicit weight was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the explicit weights in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, u32)> + '_ {
        self.values.iter().map(|(player, weight)| (*player, *weight))
    }
}

impl FromIterator<(PlayerId, u32)> for Weights {
    fn from_iter<I: IntoIterator<Item = (PlayerId, u32)>>(iter: I) -> Self {
        let mut weights = Self::new();
        for (player, weight) in iter {
            weights.insert(player, weight);
        }
        weights
    }
}

/// Externally configured set of marked players that must be spread across teams.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategorySet {
    members: BTreeSet<PlayerId>,
}

impl CategorySet {
    /// Creates an empty category set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the provided player.
    pub fn insert(&mut self, player: PlayerId) {
        let _ = self.members.insert(player);
    }

    /// Unmarks the provided player, reporting whether it was marked.
    pub fn remove(&mut self, player: PlayerId) -> bool {
        self.members.remove(&player)
    }

    /// Iterates over the marked players in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.iter().copied()
    }

    /// Reports whether the provided player is marked.
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    /// Counts the marked players among the provided identifiers.
    #[must_use]
    pub fn count_in(&self, players: &[PlayerId]) -> usize {
        players
            .iter()
            .filter(|player| self.contains(**player))
            .count()
    }

    /// Number of marked players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Reports whether no player is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<PlayerId> for CategorySet {
    fn from_iter<I: IntoIterator<Item = PlayerId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// Number of teams a partition produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TeamCount {
    /// Two teams facing each other with optional substitutes.
    #[default]
    Two,
    /// Three teams rotating on a single court.
    Three,
}

impl TeamCount {
    /// Number of teams as an integer.
    #[must_use]
    pub const fn get(&self) -> u8 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl From<TeamCount> for u8 {
    fn from(count: TeamCount) -> Self {
        count.get()
    }
}

impl TryFrom<u8> for TeamCount {
    type Error = InvalidTeamCount;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(InvalidTeamCount(other)),
        }
    }
}

/// Error raised when a team count other than 2 or 3 is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("team count must be 2 or 3, got {0}")]
pub struct InvalidTeamCount(u8);

impl InvalidTeamCount {
    /// Team count that was requested.
    #[must_use]
    pub const fn requested(&self) -> u8 {
        self.0
    }
}

/// One of the two scoreboard sides of the active pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Left-hand team of the active pair, displayed as "Team 1".
    First,
    /// Right-hand team of the active pair, displayed as "Team 2".
    Second,
}

impl Side {
    /// Resolves a side from its 1-based scoreboard number.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            _ => None,
        }
    }

    /// 1-based scoreboard number of the side.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }

    /// The opposing side.
    #[must_use]
    pub const fn other(&self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Direction of a single-point scoreboard adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScoreAdjustment {
    /// Adds one point.
    Increment,
    /// Removes one point, never dropping below zero.
    Decrement,
}

/// Named slot a present player may occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamSlot {
    /// First team.
    Team1,
    /// Second team.
    Team2,
    /// Third team, only populated in three-team sessions.
    Team3,
    /// Substitutes excluded from the partition by parity.
    Subs,
}

impl TeamSlot {
    /// Every slot in display order.
    pub const ALL: [TeamSlot; 4] = [Self::Team1, Self::Team2, Self::Team3, Self::Subs];

    /// Human readable label of the slot.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Team1 => "Team 1",
            Self::Team2 => "Team 2",
            Self::Team3 => "Team 3",
            Self::Subs => "Subs",
        }
    }
}

/// Partition of present players into three team slots plus substitutes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Teams {
    team1: Vec<PlayerId>,
    team2: Vec<PlayerId>,
    team3: Vec<PlayerId>,
    subs: Vec<PlayerId>,
}

impl Teams {
    /// Creates a partition from explicit slot contents.
    #[must_use]
    pub fn new(
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
        team3: Vec<PlayerId>,
        subs: Vec<PlayerId>,
    ) -> Self {
        let teams = Self {
            team1,
            team2,
            team3,
            subs,
        };
        debug_assert!(teams.is_disjoint(), "player assigned to multiple slots");
        teams
    }

    /// Creates a partition with every slot empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Players in the provided slot.
    #[must_use]
    pub fn slot(&self, slot: TeamSlot) -> &[PlayerId] {
        match slot {
            TeamSlot::Team1 => &self.team1,
            TeamSlot::Team2 => &self.team2,
            TeamSlot::Team3 => &self.team3,
            TeamSlot::Subs => &self.subs,
        }
    }

    fn slot_mut(&mut self, slot: TeamSlot) -> &mut Vec<PlayerId> {
        match slot {
            TeamSlot::Team1 => &mut self.team1,
            TeamSlot::Team2 => &mut self.team2,
            TeamSlot::Team3 => &mut self.team3,
            TeamSlot::Subs => &mut self.subs,
        }
    }

    /// Players in the first team.
    #[must_use]
    pub fn team1(&self) -> &[PlayerId] {
        &self.team1
    }

    /// Players in the second team.
    #[must_use]
    pub fn team2(&self) -> &[PlayerId] {
        &self.team2
    }

    /// Players in the third team.
    #[must_use]
    pub fn team3(&self) -> &[PlayerId] {
        &self.team3
    }

    /// Players sitting out as substitutes.
    #[must_use]
    pub fn subs(&self) -> &[PlayerId] {
        &self.subs
    }

    /// Reports whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        TeamSlot::ALL.iter().all(|slot| self.slot(*slot).is_empty())
    }

    /// Iterates every assigned player together with its slot.
    pub fn iter(&self) -> impl Iterator<Item = (TeamSlot, PlayerId)> + '_ {
        TeamSlot::ALL.into_iter().flat_map(move |slot| {
            self.slot(slot)
                .iter()
                .map(move |player| (slot, *player))
        })
    }

    /// Slot currently holding the provided player.
    #[must_use]
    pub fn slot_of(&self, player: PlayerId) -> Option<TeamSlot> {
        self.iter()
            .find(|(_, candidate)| *candidate == player)
            .map(|(slot, _)| slot)
    }

    /// Removes the provided player, returning the slot it occupied.
    pub fn remove(&mut self, player: PlayerId) -> Option<TeamSlot> {
        let slot = self.slot_of(player)?;
        self.slot_mut(slot).retain(|candidate| *candidate != player);
        Some(slot)
    }

    /// Exchanges the positions of two assigned players.
    ///
    /// Returns `false` without modifying the partition when either player is
    /// not assigned.
    pub fn swap(&mut self, first: PlayerId, second: PlayerId) -> bool {
        let (Some(first_slot), Some(second_slot)) = (self.slot_of(first), self.slot_of(second))
        else {
            return false;
        };

        for slot in [first_slot, second_slot] {
            for member in self.slot_mut(slot).iter_mut() {
                if *member == first {
                    *member = second;
                } else if *member == second {
                    *member = first;
                }
            }
            if first_slot == second_slot {
                break;
            }
        }
        debug_assert!(self.is_disjoint(), "swap broke slot exclusivity");
        true
    }

    /// Reports whether every player occupies at most one slot.
    #[must_use]
    pub fn is_disjoint(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.iter().all(|(_, player)| seen.insert(player))
    }
}

/// Position of the current match inside a three-team rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchIndex(u8);

impl MatchIndex {
    /// Opening match of a rotation.
    pub const FIRST: Self = Self(1);
    /// Terminal match of a rotation.
    pub const LAST: Self = Self(3);

    /// Creates a match index when the value lies in `1..=3`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::FIRST.0 && value <= Self::LAST.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the 1-based numeric index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Index of the following match; the terminal match stays terminal.
    #[must_use]
    pub const fn next(&self) -> Self {
        if self.0 < Self::LAST.0 {
            Self(self.0 + 1)
        } else {
            *self
        }
    }

    /// Slots that face off at this point of the rotation.
    #[must_use]
    pub const fn pairing(&self) -> (TeamSlot, TeamSlot) {
        match self.0 {
            1 => (TeamSlot::Team1, TeamSlot::Team2),
            2 => (TeamSlot::Team1, TeamSlot::Team3),
            _ => (TeamSlot::Team2, TeamSlot::Team3),
        }
    }
}

impl Default for MatchIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Tuning knobs of the balancing engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Number of teams to produce.
    pub team_count: TeamCount,
    /// Moves the odd player of a two-team split to the substitutes.
    pub allow_sub: bool,
    /// Derives weights from historical win rates instead of uniform weights.
    pub weighted: bool,
    /// Spreads marked players evenly across the two teams.
    pub balance_category: bool,
    /// Largest weight difference accepted before local search kicks in.
    pub max_weight_diff: f64,
}

impl BalanceConfig {
    /// Weight difference tolerated between two teams, clamped to a non-negative integer.
    #[must_use]
    pub fn max_allowed_diff(&self) -> u64 {
        if !self.max_weight_diff.is_finite() || self.max_weight_diff <= 0.0 {
            return 0;
        }
        let floored = self.max_weight_diff.floor();
        if floored >= u64::MAX as f64 {
            u64::MAX
        } else {
            floored as u64
        }
    }
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            team_count: TeamCount::Two,
            allow_sub: true,
            weighted: false,
            balance_category: false,
            max_weight_diff: 0.0,
        }
    }
}

/// Counter increments proposed for a single match participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StatDelta {
    /// Player whose counters change.
    pub player: PlayerId,
    /// Games to add; always one per declared match.
    pub games_delta: u32,
    /// Wins to add; one for the winning side, zero otherwise.
    pub wins_delta: u32,
}

/// Outcome of a declared match together with its participants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// Active-pair side that won.
    pub winner: Side,
    /// Rotation index of the match that just finished.
    pub match_index: MatchIndex,
    /// Rotation index of the match that follows.
    pub next_match_index: MatchIndex,
    /// Players of the winning team.
    pub winners: Vec<PlayerId>,
    /// Players of the losing team.
    pub losers: Vec<PlayerId>,
}

impl MatchResult {
    /// Counter increments for every participant, each player listed once.
    #[must_use]
    pub fn deltas(&self) -> Vec<StatDelta> {
        let mut seen = BTreeSet::new();
        let mut deltas = Vec::with_capacity(self.winners.len() + self.losers.len());
        let tagged = self
            .winners
            .iter()
            .map(|player| (*player, true))
            .chain(self.losers.iter().map(|player| (*player, false)));
        for (player, won) in tagged {
            if !seen.insert(player) {
                continue;
            }
            deltas.push(StatDelta {
                player,
                games_delta: 1,
                wins_delta: u32::from(won),
            });
        }
        deltas
    }
}
